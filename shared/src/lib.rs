//! # Sylva Shared
//! Object-graph value types and message addressing shared between
//! sylva-server & sylva-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod messages;
mod signal;
mod types;
mod value;

pub use messages::{
    error::MessageKindsError,
    message::{ComponentAddress, DebugHeaders, ObjectMessage},
    message_kinds::MessageKinds,
};
pub use signal::{ChangeRelay, ChangeSender, ValueChange};
pub use types::{ComponentIndex, MessageKindIndex, ObjectId, Tick};
pub use value::{
    data::{DataChanges, DataValue, ReplicationDataMap},
    error::ValueError,
    transform::{Transform, TransformDef, Vec3},
};
