use thiserror::Error;

use sylva_shared::{ComponentIndex, ObjectId};

/// Errors that can occur during scene-object operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// Attempted to mutate an object whose replication state forbids it
    #[error("object {id} is read-only (not replicating): {operation} rejected")]
    ReadOnly {
        id: ObjectId,
        operation: &'static str,
    },

    /// Attempted an operation on an object in its terminal state
    #[error("object {id} is destroyed: {operation} rejected")]
    Destroyed {
        id: ObjectId,
        operation: &'static str,
    },

    /// Reparenting an object under itself or one of its descendants
    #[error("reparenting object {id} under its own descendant would create a cycle")]
    WouldCycle {
        id: ObjectId,
    },

    /// Unlock was called on an object that is not a reflection
    #[error("object {id} is not a reflecting object")]
    NotReflecting {
        id: ObjectId,
    },

    /// Unlock requires the original to be a live, replicating object
    #[error("cannot unlock reflection {id}: the original object is not replicating")]
    OriginalNotReplicating {
        id: ObjectId,
    },

    /// A reflection unlocks at most once
    #[error("reflection {id} is already unlocked")]
    AlreadyUnlocked {
        id: ObjectId,
    },

    /// Unlock could not resolve a component registry for copying components
    #[error("cannot unlock reflection {id}: no scene provides a component registry")]
    NoComponentRegistry {
        id: ObjectId,
    },

    /// Component copy failed because the kind has no registered factory
    #[error("object {id} carries component kind {kind:?} with no registered factory")]
    UnknownComponentKind {
        id: ObjectId,
        kind: String,
    },

    /// Child lookup by name failed
    #[error("object {id} has no child named {name:?}")]
    ChildNotFound {
        id: ObjectId,
        name: String,
    },

    /// Component lookup by index failed
    #[error("object {id} has no component at index {index}")]
    ComponentNotFound {
        id: ObjectId,
        index: ComponentIndex,
    },

    /// Component lookup by kind failed
    #[error("object {id} has no component of kind {kind:?}")]
    ComponentKindNotFound {
        id: ObjectId,
        kind: String,
    },

    /// Object lookup within a scene failed
    #[error("no object {id} in scene {scene_path:?}")]
    ObjectNotFound {
        id: ObjectId,
        scene_path: String,
    },

    /// The component list is index-addressed by a u8 and cannot grow further
    #[error("object {id} already carries {count} components; the component list is full")]
    ComponentsFull {
        id: ObjectId,
        count: usize,
    },
}
