use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use sylva_shared::{ReplicationDataMap, TransformDef, ValueError};

use crate::asset::AssetError;

use super::component::ComponentKinds;
use super::object::{ObjectError, SceneObject};
use super::object::ObjectVariant;

/// Errors that can occur while loading and building prefabs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefabError {
    /// The asset provider could not supply the definition
    #[error("prefab not found: {0}")]
    Asset(#[from] AssetError),

    /// The definition string is not a valid object definition
    #[error("prefab definition failed to parse: {detail}")]
    Parse {
        detail: String,
    },

    /// A declared component kind has no registered factory
    #[error("prefab component kind {kind:?} has no registered factory")]
    UnknownComponent {
        kind: String,
    },

    /// A data entry cannot be represented as replication data
    #[error("prefab data for key {key:?} is not representable as replication data")]
    UnsupportedData {
        key: String,
    },

    /// The definition declares more components than an object can address
    #[error("prefab object {name:?} declares too many components")]
    TooManyComponents {
        name: String,
    },
}

fn data_error(err: ValueError) -> PrefabError {
    match err {
        ValueError::UnsupportedJson { key } => PrefabError::UnsupportedData { key },
        other => PrefabError::Parse { detail: other.to_string() },
    }
}

fn default_true() -> bool {
    true
}

/// A nested object-graph definition as stored in prefab/scene assets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub replicating: bool,
    #[serde(default)]
    pub transform: TransformDef,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub children: Vec<ObjectDef>,
}

/// One component attachment inside an object definition: the registry kind
/// plus the embedded state snapshot handed to `deserialize`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComponentDef {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

pub fn parse_def(source: &str) -> Result<ObjectDef, PrefabError> {
    serde_json::from_str(source).map_err(|err| PrefabError::Parse {
        detail: err.to_string(),
    })
}

/// Build the object subtree a definition describes. The result is not in
/// any scene yet; components are instantiated through the registry and
/// deserialized from their embedded data.
pub(crate) fn build_object(
    def: &ObjectDef,
    kinds: &ComponentKinds,
) -> Result<Arc<SceneObject>, PrefabError> {
    // built writable, narrowed to the definition's replication flag at the end
    let object = SceneObject::construct(&def.name, def.active, true, ObjectVariant::Prefab);

    object
        .transform()
        .apply_def(&def.transform)
        .map_err(data_error)?;

    let data = ReplicationDataMap::from_json_map(&def.data).map_err(data_error)?;
    object.data().mirror(&data).map_err(data_error)?;

    for component_def in &def.components {
        let mut component =
            kinds
                .build(&component_def.kind)
                .map_err(|_| PrefabError::UnknownComponent {
                    kind: component_def.kind.clone(),
                })?;
        let snapshot = ReplicationDataMap::from_json_map(&component_def.data).map_err(data_error)?;
        component.deserialize(&snapshot);
        object
            .attach_component_internal(component)
            .map_err(|err| match err {
                ObjectError::ComponentsFull { .. } => PrefabError::TooManyComponents {
                    name: def.name.clone(),
                },
                other => PrefabError::Parse {
                    detail: other.to_string(),
                },
            })?;
    }

    for child_def in &def.children {
        let child = build_object(child_def, kinds)?;
        object.link_child(&child);
    }

    if !def.replicating {
        *object.replicating_write() = false;
        object.transform().lock();
        object.data().lock();
    }

    Ok(object)
}

impl SceneObject {
    /// Serialize this object's subtree back into definition form, the
    /// inverse of prefab building.
    pub fn to_def(&self) -> ObjectDef {
        let components = self
            .components()
            .iter()
            .map(|component| {
                let snapshot = ReplicationDataMap::new();
                component.serialize_into(&snapshot);
                ComponentDef {
                    kind: component.kind().to_string(),
                    data: snapshot.to_json_map(),
                }
            })
            .collect();
        ObjectDef {
            name: self.name(),
            active: self.active(),
            replicating: self.replicating(),
            transform: self.transform().def(),
            data: self.data().to_json_map(),
            components,
            children: self.children().iter().map(|child| child.to_def()).collect(),
        }
    }
}
