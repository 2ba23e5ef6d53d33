use thiserror::Error;

use crate::types::MessageKindIndex;

/// Errors that can occur during message-kind registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageKindsError {
    /// Message kind already present in the registry
    #[error("message kind {kind:?} is already registered")]
    AlreadyRegistered {
        kind: String,
    },

    /// Registry was sealed when the owning object entered a scene
    #[error("message kind {kind:?} cannot be registered: the registry is sealed")]
    RegistrySealed {
        kind: String,
    },

    /// Registry cannot hold more kinds than the index type addresses
    #[error("message kind {kind:?} cannot be registered: the registry is full")]
    RegistryFull {
        kind: String,
    },

    /// Message kind not found in registry
    #[error("message kind {kind:?} not found in registry")]
    KindNotFound {
        kind: String,
    },

    /// Index not found in registry
    #[error("message kind index {index} not found in registry")]
    IndexNotFound {
        index: MessageKindIndex,
    },
}
