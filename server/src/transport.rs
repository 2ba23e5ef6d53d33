use std::sync::Arc;

use sylva_shared::{ComponentAddress, MessageKindIndex, ObjectMessage};

use crate::connection::ConnectionId;

/// Outbound delivery seam toward the (external) wire transport.
///
/// The scene graph hands fully addressed messages to this trait and never
/// performs network I/O itself. Inbound messages of the same shape come back
/// through [`Scene::deliver`](crate::Scene::deliver).
pub trait MessageTransport: Send + Sync {
    /// Deliver to a single connection.
    fn send_to(&self, connection: ConnectionId, message: &ObjectMessage);
    /// Deliver to every connection observing the message's room.
    fn broadcast(&self, message: &ObjectMessage);
}

/// A sender pre-addressed back to the connection that originated an inbound
/// message, handed to `ObjectComponent::handle_message`.
#[derive(Clone)]
pub struct ReplySender {
    transport: Arc<dyn MessageTransport>,
    connection: ConnectionId,
    address: ComponentAddress,
}

impl ReplySender {
    pub(crate) fn new(
        transport: Arc<dyn MessageTransport>,
        connection: ConnectionId,
        address: ComponentAddress,
    ) -> Self {
        Self {
            transport,
            connection,
            address,
        }
    }

    /// The connection this sender replies to.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn reply(&self, kind_index: MessageKindIndex, payload: Vec<u8>) {
        let message = ObjectMessage {
            address: self.address.clone(),
            kind_index,
            payload,
            debug: None,
        };
        self.transport.send_to(self.connection, &message);
    }
}
