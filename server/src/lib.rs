//! # Sylva Server
//! Server-authoritative scene-graph replication: a concurrently-readable
//! tree of networked objects with component lifecycles, per-tick structural
//! delta sets and copy-on-write reflections for connection-specific views.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use sylva_shared::{
        ChangeRelay, ChangeSender, ComponentAddress, ComponentIndex, DataChanges, DataValue,
        DebugHeaders, MessageKindIndex, MessageKinds, MessageKindsError, ObjectId, ObjectMessage,
        ReplicationDataMap, Tick, Transform, TransformDef, ValueChange, ValueError, Vec3,
    };
}

mod asset;
mod connection;
mod scene;
mod transport;

pub use asset::{AssetError, AssetProvider};
pub use connection::{Connection, ConnectionId};
pub use scene::{
    component::{
        AttachedComponent, ComponentKinds, ComponentKindsError, ComponentMessenger, Lifecycle,
        MessengerError, ObjectComponent,
    },
    object::{ObjectError, ObjectRole, SceneObject},
    parse_def, ComponentDef, ObjectDef, ObjectEvent, PrefabError, Scene, SceneContext,
    SceneDeltas, SceneListener,
};
pub use transport::{MessageTransport, ReplySender};
