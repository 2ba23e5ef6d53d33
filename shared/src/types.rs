use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Server tick counter.
pub type Tick = u64;

/// Positional index of a component within an object's component list.
///
/// This index is part of the wire address of every component message, so it
/// is only stable while the component list is not mutated.
pub type ComponentIndex = u8;

/// Index of a message kind within a component's sealed registry.
pub type MessageKindIndex = u8;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Globally unique identity of a scene object, immutable once assigned.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate the next id from the process-wide counter.
    pub fn allocate() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "object-{}", self.0)
    }
}
