use thiserror::Error;

/// Errors that can occur when sending component messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessengerError {
    /// The kind was never declared in this component's registry
    #[error("message kind {kind:?} was never registered with this component")]
    KindNotRegistered {
        kind: String,
    },

    /// The owning object is not currently in a scene
    #[error("component messages cannot be sent: the owning object is not in a scene")]
    NotInScene,
}

/// Errors that can occur during component-kind registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentKindsError {
    /// Component kind already has a factory registered
    #[error("component kind {kind:?} already has a registered factory")]
    DuplicateKind {
        kind: String,
    },

    /// No factory registered under the requested kind
    #[error("component kind {kind:?} not found in registry")]
    UnknownKind {
        kind: String,
    },
}
