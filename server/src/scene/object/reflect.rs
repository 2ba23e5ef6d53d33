use std::sync::Arc;

use sylva_shared::ReplicationDataMap;

use super::{ObjectError, ObjectVariant, SceneObject};

/// The reflection-specific half of a `SceneObject`: the wrapped original
/// and the parent the copy will attach to once unlocked.
pub(crate) struct ReflectState {
    pub original: Arc<SceneObject>,
    pub designated_parent: Option<Arc<SceneObject>>,
}

impl SceneObject {
    /// Create a reflecting proxy over `original`.
    ///
    /// While locked, every read passes through to the original and every
    /// mutator fails; [`unlock`](SceneObject::unlock) converts the proxy
    /// into an independent copy exactly once.
    pub fn reflect(
        original: &Arc<SceneObject>,
        designated_parent: Option<&Arc<SceneObject>>,
    ) -> Arc<SceneObject> {
        Self::construct(
            "",
            false,
            false,
            ObjectVariant::Reflecting(ReflectState {
                original: original.clone(),
                designated_parent: designated_parent.cloned(),
            }),
        )
    }

    /// One-time copy-on-write transition.
    ///
    /// Captures the original's current name/active/transform/data by value
    /// and re-instantiates each of its components through the component
    /// registry via a construct-then-serialize/deserialize round trip. After
    /// this returns, the object is replicating, fully independent of the
    /// original, and never reads the original again.
    pub fn unlock(self: &Arc<Self>) -> Result<(), ObjectError> {
        let ObjectVariant::Reflecting(reflect) = &self.variant else {
            return Err(ObjectError::NotReflecting { id: self.id() });
        };
        if self.is_destroyed() {
            return Err(ObjectError::Destroyed {
                id: self.id(),
                operation: "unlock",
            });
        }
        if self.replicating() {
            return Err(ObjectError::AlreadyUnlocked { id: self.id() });
        }
        let original = &reflect.original;
        if !original.replicating() {
            return Err(ObjectError::OriginalNotReplicating { id: self.id() });
        }

        // Resolve the component registry before touching any state, so a
        // failed unlock leaves the proxy fully locked.
        let original_components = original.components();
        let registry_scene = if original_components.is_empty() {
            None
        } else {
            let scene = reflect
                .designated_parent
                .as_ref()
                .and_then(|parent| parent.scene())
                .or_else(|| original.scene());
            match scene {
                Some(scene) => Some(scene),
                None => return Err(ObjectError::NoComponentRegistry { id: self.id() }),
            }
        };

        let mut copies = Vec::with_capacity(original_components.len());
        if let Some(scene) = &registry_scene {
            let kinds = &scene.context().components;
            for source in &original_components {
                let mut copy =
                    kinds
                        .build(source.kind())
                        .map_err(|_| ObjectError::UnknownComponentKind {
                            id: self.id(),
                            kind: source.kind().to_string(),
                        })?;
                let snapshot = ReplicationDataMap::new();
                source.serialize_into(&snapshot);
                copy.deserialize(&snapshot);
                copies.push(copy);
            }
        }

        // Capture by value. From here on the proxy never reads the original.
        {
            let mut state = self.state_write();
            state.name = original.name();
            state.path = state.name.clone();
            state.active = original.active();
        }
        self.transform
            .mirror(&original.transform())
            .map_err(|_| ObjectError::ReadOnly {
                id: self.id(),
                operation: "unlock",
            })?;
        self.data
            .mirror(&original.data())
            .map_err(|_| ObjectError::ReadOnly {
                id: self.id(),
                operation: "unlock",
            })?;

        *self.replicating_write() = true;

        for copy in copies {
            self.attach_component_internal(copy)?;
        }

        if let Some(parent) = reflect.designated_parent.clone() {
            self.set_parent(Some(&parent))?;
        }
        log::info!("unlocked reflection {} of {}", self.id(), original.id());
        Ok(())
    }
}
