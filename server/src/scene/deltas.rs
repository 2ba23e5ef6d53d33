use sylva_shared::ObjectId;

/// Structural changes accumulated by a scene since the last drain.
///
/// The external synchronizer drains these once per tick to emit incremental
/// wire updates without re-diffing the whole tree. Draining is a consistent
/// snapshot-and-clear, so no delta is lost or double-reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneDeltas {
    /// Prefabs spawned as roots: (object id, asset path).
    pub spawned_prefabs: Vec<(ObjectId, String)>,
    /// Objects whose parent changed.
    pub reparented: Vec<ObjectId>,
    /// Objects that moved into this scene (the whole moved subtree).
    pub entered: Vec<ObjectId>,
    /// Objects destroyed while in this scene.
    pub destroyed: Vec<ObjectId>,
}

impl SceneDeltas {
    pub fn is_empty(&self) -> bool {
        self.spawned_prefabs.is_empty()
            && self.reparented.is_empty()
            && self.entered.is_empty()
            && self.destroyed.is_empty()
    }
}
