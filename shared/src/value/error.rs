use thiserror::Error;

/// Errors that can occur during value-object operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Attempted to mutate a value that is locked or owned by a read-only map
    #[error("{target} is read-only and cannot be mutated")]
    ReadOnly {
        target: &'static str,
    },

    /// Attempted to open a shard on a key holding a plain value
    #[error("key {key:?} holds a plain value, not a shard")]
    NotAShard {
        key: String,
    },

    /// A JSON value could not be represented as a DataValue
    #[error("value for key {key:?} cannot be represented as replication data")]
    UnsupportedJson {
        key: String,
    },
}
