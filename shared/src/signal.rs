use std::sync::Arc;

/// A single mutation observed on a value object owned by a scene object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueChange {
    /// Any component of the transform was written.
    Transform,
    /// A data-map key was set to a new value.
    DataSet(String),
    /// A data-map key was removed.
    DataRemoved(String),
}

/// Receives change notifications raised by value objects.
///
/// The owning scene object installs a relay into its `Transform` and
/// `ReplicationDataMap` so that every successful mutation is observed and can
/// be bubbled toward the scene.
pub trait ChangeRelay: Send + Sync {
    fn raise(&self, change: ValueChange);
}

/// Cloneable handle through which a value object reports its mutations.
#[derive(Clone)]
pub struct ChangeSender {
    relay: Arc<dyn ChangeRelay>,
}

impl ChangeSender {
    pub fn new(relay: Arc<dyn ChangeRelay>) -> Self {
        Self { relay }
    }

    pub fn raise(&self, change: ValueChange) {
        self.relay.raise(change);
    }
}
