use thiserror::Error;

/// Errors that can occur while resolving assets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// No asset exists under the requested path
    #[error("asset {path:?} not found")]
    NotFound {
        path: String,
    },
}

/// Source of serialized prefab/scene definitions.
///
/// Implemented by the (external) asset pipeline; the scene graph never owns
/// its lifecycle.
pub trait AssetProvider: Send + Sync {
    fn asset_string(&self, path: &str) -> Result<String, AssetError>;
}
