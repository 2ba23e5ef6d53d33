use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sylva_shared::{
    ComponentAddress, DebugHeaders, MessageKindIndex, MessageKinds, MessageKindsError,
    ObjectMessage,
};

use crate::connection::ConnectionId;
use crate::transport::MessageTransport;

use super::error::MessengerError;

/// Where a component's messages go while its object is in a scene.
pub(crate) struct MessengerBinding {
    pub address: ComponentAddress,
    pub transport: Arc<dyn MessageTransport>,
    pub connection: Option<ConnectionId>,
    pub debug: bool,
    pub component_kind: String,
}

/// A component's message registry plus its scene binding.
///
/// Embedded by component implementations; the engine seals the registry and
/// installs the binding when the owning object enters a scene, the way
/// property mutators are installed on replicated state.
#[derive(Default)]
pub struct ComponentMessenger {
    kinds: MessageKinds,
    binding: RwLock<Option<MessengerBinding>>,
}

impl ComponentMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a message kind. Must happen before the owning object enters a
    /// scene; the assigned index is the kind's wire index for the
    /// component's lifetime.
    pub fn register(&mut self, kind: &str) -> Result<MessageKindIndex, MessageKindsError> {
        self.kinds.register(kind)
    }

    pub fn kinds(&self) -> &MessageKinds {
        &self.kinds
    }

    pub fn is_sealed(&self) -> bool {
        self.kinds.is_sealed()
    }

    pub fn is_bound(&self) -> bool {
        self.read_binding().is_some()
    }

    fn read_binding(&self) -> RwLockReadGuard<'_, Option<MessengerBinding>> {
        let Ok(binding) = self.binding.read() else {
            panic!("ComponentMessenger binding lock poisoned");
        };
        binding
    }

    fn write_binding(&self) -> RwLockWriteGuard<'_, Option<MessengerBinding>> {
        let Ok(binding) = self.binding.write() else {
            panic!("ComponentMessenger binding lock poisoned");
        };
        binding
    }

    pub(crate) fn seal(&mut self) {
        self.kinds.seal();
    }

    pub(crate) fn bind(&self, binding: MessengerBinding) {
        *self.write_binding() = Some(binding);
    }

    pub(crate) fn unbind(&self) {
        *self.write_binding() = None;
    }

    /// Send a registered message kind toward the object's owning connection,
    /// or broadcast into the room when no connection owns the object.
    pub fn send(&self, kind: &str, payload: Vec<u8>) -> Result<(), MessengerError> {
        let kind_index = self
            .kinds
            .index_of(kind)
            .map_err(|_| MessengerError::KindNotRegistered { kind: kind.to_string() })?;
        let binding = self.read_binding();
        let Some(binding) = &*binding else {
            return Err(MessengerError::NotInScene);
        };
        let debug = binding.debug.then(|| DebugHeaders {
            component_kind: binding.component_kind.clone(),
            registry: self.kinds.entries(),
        });
        let message = ObjectMessage {
            address: binding.address.clone(),
            kind_index,
            payload,
            debug,
        };
        match binding.connection {
            Some(connection) => binding.transport.send_to(connection, &message),
            None => binding.transport.broadcast(&message),
        }
        Ok(())
    }
}
