pub mod component;
mod deltas;
mod events;
pub mod object;
mod prefab;
mod scene;

#[cfg(test)]
mod tests;

pub use deltas::SceneDeltas;
pub use events::{ObjectEvent, SceneListener};
pub use prefab::{parse_def, ComponentDef, ObjectDef, PrefabError};
pub use scene::{Scene, SceneContext};
