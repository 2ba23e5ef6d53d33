use crate::types::{ComponentIndex, MessageKindIndex, ObjectId};

/// Addressing prefix carried by every component message: which scene, which
/// room partition, which object, and which component slot on that object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentAddress {
    pub scene_path: String,
    pub room: String,
    pub object_id: ObjectId,
    pub component_index: ComponentIndex,
}

/// Diagnostic headers attached to outbound messages when debug mode is on.
/// Tooling only; never load-bearing for routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugHeaders {
    pub component_kind: String,
    pub registry: Vec<(String, MessageKindIndex)>,
}

/// A component message in its addressed wire shape, both outbound and
/// inbound. The payload encoding is the component's own business.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectMessage {
    pub address: ComponentAddress,
    pub kind_index: MessageKindIndex,
    pub payload: Vec<u8>,
    pub debug: Option<DebugHeaders>,
}
