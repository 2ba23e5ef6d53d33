use std::fmt;

/// Identity of a client connection, assigned by the transport layer.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "connection-{}", self.0)
    }
}

/// A client connection as seen from the scene graph: identity and liveness.
///
/// Connection lifecycle (handshake, channels, encryption) belongs to the
/// transport layer; the scene graph only associates objects with a
/// connection for message routing and reacts to disconnects via
/// [`Scene::handle_disconnect`](crate::Scene::handle_disconnect).
pub trait Connection: Send + Sync {
    fn id(&self) -> ConnectionId;
    fn is_open(&self) -> bool;
}
