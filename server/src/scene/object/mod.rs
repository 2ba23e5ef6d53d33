mod error;
mod reflect;

pub use error::ObjectError;

pub(crate) use reflect::ReflectState;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use sylva_shared::{
    ChangeRelay, ChangeSender, ComponentAddress, ComponentIndex, ObjectId, ReplicationDataMap,
    Transform, ValueChange,
};

use crate::connection::Connection;
use crate::scene::component::{AttachedComponent, MessengerBinding, ObjectComponent};
use crate::scene::events::ObjectEvent;
use crate::scene::scene::Scene;

/// Which of the three interchangeable implementations an object is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectRole {
    /// Server-created at runtime; replicating for its entire life.
    Authoritative,
    /// Built from a parsed prefab/scene definition.
    Prefab,
    /// Proxy view over another object, convertible once into an independent
    /// copy.
    Reflecting,
}

pub(crate) enum ObjectVariant {
    Authoritative,
    Prefab,
    Reflecting(ReflectState),
}

#[derive(Debug)]
struct ObjectState {
    name: String,
    path: String,
    active: bool,
}

/// A node of the replication tree.
///
/// Objects are shared (`Arc`) between the tick thread that mutates them and
/// the networking threads that read them; every mutable collection sits
/// behind its own lock and readers take cloned snapshots. Mutators are
/// guarded by the object's replication state; a non-replicating object is a
/// read-only view.
pub struct SceneObject {
    id: ObjectId,
    pub(crate) variant: ObjectVariant,
    weak_self: Weak<SceneObject>,
    replicating: RwLock<bool>,
    state: RwLock<ObjectState>,
    transform: Transform,
    data: ReplicationDataMap,
    parent: RwLock<Weak<SceneObject>>,
    children: RwLock<Vec<Arc<SceneObject>>>,
    components: RwLock<Vec<Arc<AttachedComponent>>>,
    scene: RwLock<Weak<Scene>>,
    owning_connection: RwLock<Option<Arc<dyn Connection>>>,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for SceneObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneObject")
            .field("id", &self.id)
            .field("state", &*self.state.read().unwrap())
            .field("replicating", &*self.replicating.read().unwrap())
            .field("destroyed", &self.destroyed.load(Ordering::Relaxed))
            .finish()
    }
}

struct ObjectChangeRelay {
    object: Weak<SceneObject>,
}

impl ChangeRelay for ObjectChangeRelay {
    fn raise(&self, change: ValueChange) {
        let Some(object) = self.object.upgrade() else {
            return;
        };
        object.on_value_change(change);
    }
}

impl SceneObject {
    /// Create a server-authoritative object. It replicates for its entire
    /// life and starts active, outside any scene.
    pub fn new(name: &str) -> Arc<SceneObject> {
        Self::construct(name, true, true, ObjectVariant::Authoritative)
    }

    pub(crate) fn construct(
        name: &str,
        active: bool,
        replicating: bool,
        variant: ObjectVariant,
    ) -> Arc<SceneObject> {
        Arc::new_cyclic(|weak: &Weak<SceneObject>| {
            let transform = Transform::new();
            let data = ReplicationDataMap::new();
            let sender = ChangeSender::new(Arc::new(ObjectChangeRelay { object: weak.clone() }));
            transform.set_sender(sender.clone());
            data.set_sender(sender);
            SceneObject {
                id: ObjectId::allocate(),
                variant,
                weak_self: weak.clone(),
                replicating: RwLock::new(replicating),
                state: RwLock::new(ObjectState {
                    name: name.to_string(),
                    path: name.to_string(),
                    active,
                }),
                transform,
                data,
                parent: RwLock::new(Weak::new()),
                children: RwLock::new(Vec::new()),
                components: RwLock::new(Vec::new()),
                scene: RwLock::new(Weak::new()),
                owning_connection: RwLock::new(None),
                destroyed: AtomicBool::new(false),
            }
        })
    }

    // Lock plumbing

    fn state_read(&self) -> RwLockReadGuard<'_, ObjectState> {
        let Ok(state) = self.state.read() else {
            panic!("SceneObject state lock poisoned");
        };
        state
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, ObjectState> {
        let Ok(state) = self.state.write() else {
            panic!("SceneObject state lock poisoned");
        };
        state
    }

    fn children_write(&self) -> RwLockWriteGuard<'_, Vec<Arc<SceneObject>>> {
        let Ok(children) = self.children.write() else {
            panic!("SceneObject children lock poisoned");
        };
        children
    }

    fn components_write(&self) -> RwLockWriteGuard<'_, Vec<Arc<AttachedComponent>>> {
        let Ok(components) = self.components.write() else {
            panic!("SceneObject components lock poisoned");
        };
        components
    }

    fn parent_slot_write(&self) -> RwLockWriteGuard<'_, Weak<SceneObject>> {
        let Ok(parent) = self.parent.write() else {
            panic!("SceneObject parent lock poisoned");
        };
        parent
    }

    fn scene_slot_write(&self) -> RwLockWriteGuard<'_, Weak<Scene>> {
        let Ok(scene) = self.scene.write() else {
            panic!("SceneObject scene lock poisoned");
        };
        scene
    }

    pub(crate) fn replicating_write(&self) -> RwLockWriteGuard<'_, bool> {
        let Ok(replicating) = self.replicating.write() else {
            panic!("SceneObject replicating lock poisoned");
        };
        replicating
    }

    // Identity & reads

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn role(&self) -> ObjectRole {
        match &self.variant {
            ObjectVariant::Authoritative => ObjectRole::Authoritative,
            ObjectVariant::Prefab => ObjectRole::Prefab,
            ObjectVariant::Reflecting(_) => ObjectRole::Reflecting,
        }
    }

    pub fn replicating(&self) -> bool {
        let Ok(replicating) = self.replicating.read() else {
            panic!("SceneObject replicating lock poisoned");
        };
        *replicating
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// The original behind a still-locked reflection, if reads delegate.
    fn read_through(&self) -> Option<Arc<SceneObject>> {
        match &self.variant {
            ObjectVariant::Reflecting(reflect) if !self.replicating() => {
                Some(reflect.original.clone())
            }
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        if let Some(original) = self.read_through() {
            return original.name();
        }
        self.state_read().name.clone()
    }

    /// `name` for a root, else `parent.path + "/" + name`; kept consistent
    /// with the parent chain across reparents and renames.
    pub fn path(&self) -> String {
        if let Some(original) = self.read_through() {
            return original.path();
        }
        self.state_read().path.clone()
    }

    pub fn active(&self) -> bool {
        if let Some(original) = self.read_through() {
            return original.active();
        }
        self.state_read().active
    }

    /// Handle onto this object's transform. A still-locked reflection
    /// returns a fresh read-only copy of the original's transform instead.
    pub fn transform(&self) -> Transform {
        if let Some(original) = self.read_through() {
            return original.transform().locked_copy();
        }
        self.transform.clone()
    }

    /// Handle onto this object's data map. A still-locked reflection
    /// returns a fresh read-only snapshot of the original's data instead.
    pub fn data(&self) -> ReplicationDataMap {
        if let Some(original) = self.read_through() {
            return original.data().snapshot();
        }
        self.data.clone()
    }

    pub fn parent(&self) -> Option<Arc<SceneObject>> {
        let Ok(parent) = self.parent.read() else {
            panic!("SceneObject parent lock poisoned");
        };
        parent.upgrade()
    }

    pub fn scene(&self) -> Option<Arc<Scene>> {
        let Ok(scene) = self.scene.read() else {
            panic!("SceneObject scene lock poisoned");
        };
        scene.upgrade()
    }

    /// Snapshot of the ordered child list.
    pub fn children(&self) -> Vec<Arc<SceneObject>> {
        let Ok(children) = self.children.read() else {
            panic!("SceneObject children lock poisoned");
        };
        children.clone()
    }

    /// Snapshot of the ordered component list.
    pub fn components(&self) -> Vec<Arc<AttachedComponent>> {
        let Ok(components) = self.components.read() else {
            panic!("SceneObject components lock poisoned");
        };
        components.clone()
    }

    /// The connection owning this object; when unset, inherited from the
    /// parent chain.
    pub fn owning_connection(&self) -> Option<Arc<dyn Connection>> {
        {
            let Ok(connection) = self.owning_connection.read() else {
                panic!("SceneObject connection lock poisoned");
            };
            if let Some(connection) = &*connection {
                return Some(connection.clone());
            }
        }
        self.parent().and_then(|parent| parent.owning_connection())
    }

    // Lookups

    pub fn child_by_name(&self, name: &str) -> Result<Arc<SceneObject>, ObjectError> {
        self.children()
            .into_iter()
            .find(|child| child.name() == name)
            .ok_or_else(|| ObjectError::ChildNotFound {
                id: self.id,
                name: name.to_string(),
            })
    }

    /// Walk a relative path (`"a/b/c"`) through the child lists.
    pub fn descendant_by_path(&self, path: &str) -> Result<Arc<SceneObject>, ObjectError> {
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());
        let first = segments.next().ok_or_else(|| ObjectError::ChildNotFound {
            id: self.id,
            name: path.to_string(),
        })?;
        let mut current = self.child_by_name(first)?;
        for segment in segments {
            current = current.child_by_name(segment)?;
        }
        Ok(current)
    }

    pub fn component_at(&self, index: ComponentIndex) -> Result<Arc<AttachedComponent>, ObjectError> {
        self.components()
            .get(index as usize)
            .cloned()
            .ok_or(ObjectError::ComponentNotFound { id: self.id, index })
    }

    pub fn component_by_kind(&self, kind: &str) -> Result<Arc<AttachedComponent>, ObjectError> {
        self.components()
            .into_iter()
            .find(|component| component.kind() == kind)
            .ok_or_else(|| ObjectError::ComponentKindNotFound {
                id: self.id,
                kind: kind.to_string(),
            })
    }

    // Mutators

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), ObjectError> {
        if self.is_destroyed() {
            return Err(ObjectError::Destroyed { id: self.id, operation });
        }
        if !self.replicating() {
            return Err(ObjectError::ReadOnly { id: self.id, operation });
        }
        Ok(())
    }

    pub fn set_name(&self, name: &str) -> Result<(), ObjectError> {
        self.ensure_mutable("set_name")?;
        {
            let mut state = self.state_write();
            state.name = name.to_string();
        }
        self.refresh_paths();
        self.bubble(ObjectEvent::Renamed {
            id: self.id,
            name: name.to_string(),
        });
        Ok(())
    }

    /// Toggle the active flag. Component Enable/Disable hooks run strictly
    /// after the field mutation, and only when the value actually flips.
    pub fn set_active(&self, active: bool) -> Result<(), ObjectError> {
        self.ensure_mutable("set_active")?;
        let flipped = {
            let mut state = self.state_write();
            let was = state.active;
            state.active = active;
            was != active
        };
        if !flipped {
            return Ok(());
        }
        for component in self.components() {
            component.set_enabled(active);
        }
        self.bubble(ObjectEvent::ActiveChanged { id: self.id, active });
        Ok(())
    }

    /// Reparent this object. `None` detaches it back into the root set of
    /// its current scene. Fires the scene-change notification before the
    /// reparent notification when the resolved scene differs.
    pub fn set_parent(
        self: &Arc<Self>,
        new_parent: Option<&Arc<SceneObject>>,
    ) -> Result<(), ObjectError> {
        self.ensure_mutable("set_parent")?;
        if let Some(parent) = new_parent {
            if parent.is_destroyed() {
                return Err(ObjectError::Destroyed {
                    id: parent.id,
                    operation: "set_parent",
                });
            }
            if Arc::ptr_eq(parent, self) || parent.is_descendant_of(self) {
                return Err(ObjectError::WouldCycle { id: self.id });
            }
        }

        let old_parent = self.parent();
        let old_scene = self.scene();

        if let Some(old) = &old_parent {
            old.remove_child(self);
        }

        let new_scene = match new_parent {
            Some(parent) => {
                if old_parent.is_none() {
                    if let Some(scene) = &old_scene {
                        scene.remove_root(self);
                    }
                }
                parent.add_child(self);
                *self.parent_slot_write() = Arc::downgrade(parent);
                parent.scene()
            }
            None => {
                *self.parent_slot_write() = Weak::new();
                if let Some(scene) = &old_scene {
                    scene.add_root(self);
                }
                old_scene.clone()
            }
        };

        self.refresh_paths();

        let scene_changed = match (&old_scene, &new_scene) {
            (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
            (None, None) => false,
            _ => true,
        };
        if scene_changed {
            if old_scene.is_some() {
                self.exit_scene_subtree();
            }
            if let Some(scene) = &new_scene {
                self.enter_scene_subtree(scene);
            }
            self.bubble(ObjectEvent::SceneChanged { id: self.id });
        }
        if let Some(scene) = &new_scene {
            scene.note_reparented(self.id);
        }
        self.bubble(ObjectEvent::Reparented { id: self.id });
        log::trace!(
            "reparented {} under {:?}",
            self.id,
            new_parent.map(|parent| parent.id)
        );
        Ok(())
    }

    /// Make this object a root of `scene`, detaching it from any parent.
    pub fn set_scene(self: &Arc<Self>, scene: &Arc<Scene>) -> Result<(), ObjectError> {
        self.ensure_mutable("set_scene")?;
        self.place_in_scene(scene);
        Ok(())
    }

    pub(crate) fn place_in_scene(self: &Arc<Self>, scene: &Arc<Scene>) {
        let old_scene = self.scene();
        match self.parent() {
            Some(parent) => {
                parent.remove_child(self);
                *self.parent_slot_write() = Weak::new();
            }
            None => {
                if let Some(old) = &old_scene {
                    old.remove_root(self);
                }
            }
        }
        scene.add_root(self);
        self.refresh_paths();
        let same = old_scene
            .as_ref()
            .map_or(false, |old| Arc::ptr_eq(old, scene));
        if !same {
            if old_scene.is_some() {
                self.exit_scene_subtree();
            }
            self.enter_scene_subtree(scene);
            self.bubble(ObjectEvent::SceneChanged { id: self.id });
        }
    }

    pub fn set_owning_connection(
        &self,
        connection: Option<Arc<dyn Connection>>,
    ) -> Result<(), ObjectError> {
        self.ensure_mutable("set_owning_connection")?;
        {
            let Ok(mut slot) = self.owning_connection.write() else {
                panic!("SceneObject connection lock poisoned");
            };
            *slot = connection;
        }
        self.rebind_components();
        Ok(())
    }

    // Components

    /// Attach a component at the end of the list. If the object is already
    /// in a scene the component goes live immediately (Init/Start, Enable
    /// when active).
    pub fn attach_component(
        self: &Arc<Self>,
        component: Box<dyn ObjectComponent>,
    ) -> Result<ComponentIndex, ObjectError> {
        self.ensure_mutable("attach_component")?;
        let (attached, index) = self.attach_component_internal(component)?;
        if let Some(scene) = self.scene() {
            attached.enter_scene(
                self.messenger_binding_for(&scene, index, attached.kind()),
                self.active(),
            );
        }
        Ok(index)
    }

    pub(crate) fn attach_component_internal(
        &self,
        component: Box<dyn ObjectComponent>,
    ) -> Result<(Arc<AttachedComponent>, ComponentIndex), ObjectError> {
        let mut components = self.components_write();
        if components.len() > ComponentIndex::MAX as usize {
            return Err(ObjectError::ComponentsFull {
                id: self.id,
                count: components.len(),
            });
        }
        let index = components.len() as ComponentIndex;
        let attached = Arc::new(AttachedComponent::new(component));
        components.push(attached.clone());
        Ok((attached, index))
    }

    /// Detach and destroy the component at `index`.
    ///
    /// Every later component shifts down one slot, so in-flight messages
    /// addressed by the old positions may misroute; the local bindings are
    /// refreshed, the wire has no such luxury.
    pub fn detach_component(self: &Arc<Self>, index: ComponentIndex) -> Result<(), ObjectError> {
        self.ensure_mutable("detach_component")?;
        let removed = {
            let mut components = self.components_write();
            if (index as usize) < components.len() {
                Some(components.remove(index as usize))
            } else {
                None
            }
        };
        let Some(removed) = removed else {
            return Err(ObjectError::ComponentNotFound { id: self.id, index });
        };
        removed.teardown();
        self.rebind_components();
        Ok(())
    }

    // Destruction

    /// Destroy this object and, recursively, all of its descendants.
    /// Descendants are torn down regardless of their own replication state.
    /// Destroying an already-destroyed object is a no-op.
    pub fn destroy(self: &Arc<Self>) -> Result<(), ObjectError> {
        if self.is_destroyed() {
            return Ok(());
        }
        if !self.replicating() {
            return Err(ObjectError::ReadOnly {
                id: self.id,
                operation: "destroy",
            });
        }
        self.destroy_forced();
        Ok(())
    }

    /// Internally-triggered teardown, bypassing the read-only guard.
    pub(crate) fn destroy_forced(self: &Arc<Self>) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let scene = self.scene();
        for child in self.children() {
            child.destroy_forced();
        }
        self.children_write().clear();
        let components = {
            let mut slot = self.components_write();
            std::mem::take(&mut *slot)
        };
        for component in components {
            component.teardown();
        }
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        } else if let Some(scene) = &scene {
            scene.remove_root(self);
        }
        if let Some(scene) = &scene {
            scene.unindex_object(self.id);
            scene.note_destroyed(self.id);
            scene.forward(&ObjectEvent::Destroyed { id: self.id });
        }
        *self.parent_slot_write() = Weak::new();
        *self.scene_slot_write() = Weak::new();
        log::trace!("destroyed {}", self.id);
    }

    // Tree bookkeeping

    fn add_child(&self, child: &Arc<SceneObject>) {
        self.children_write().push(child.clone());
    }

    fn remove_child(&self, child: &Arc<SceneObject>) {
        self.children_write().retain(|entry| entry.id != child.id);
    }

    /// Link a freshly built child during prefab construction: no guards, no
    /// notifications, the subtree is not in a scene yet.
    pub(crate) fn link_child(self: &Arc<Self>, child: &Arc<SceneObject>) {
        *child.parent_slot_write() = Arc::downgrade(self);
        self.add_child(child);
        child.refresh_paths();
    }

    fn is_descendant_of(&self, ancestor: &Arc<SceneObject>) -> bool {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.id == ancestor.id {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Recompute this object's path from its parent chain, then refresh the
    /// whole subtree beneath it.
    pub(crate) fn refresh_paths(&self) {
        let parent_path = self.parent().map(|parent| parent.path());
        {
            let mut state = self.state_write();
            state.path = match &parent_path {
                Some(prefix) => format!("{}/{}", prefix, state.name),
                None => state.name.clone(),
            };
        }
        for child in self.children() {
            child.refresh_paths();
        }
    }

    // Scene membership

    pub(crate) fn enter_scene_subtree(self: &Arc<Self>, scene: &Arc<Scene>) {
        *self.scene_slot_write() = Arc::downgrade(scene);
        scene.index_object(self);
        scene.note_entered(self.id);
        let active = self.active();
        for (index, component) in self.components().iter().enumerate() {
            component.enter_scene(
                self.messenger_binding_for(scene, index as ComponentIndex, component.kind()),
                active,
            );
        }
        for child in self.children() {
            child.enter_scene_subtree(scene);
        }
    }

    pub(crate) fn exit_scene_subtree(&self) {
        for component in self.components() {
            component.exit_scene();
        }
        if let Some(scene) = self.scene() {
            scene.unindex_object(self.id);
        }
        *self.scene_slot_write() = Weak::new();
        for child in self.children() {
            child.exit_scene_subtree();
        }
    }

    fn messenger_binding_for(
        &self,
        scene: &Arc<Scene>,
        index: ComponentIndex,
        kind: &str,
    ) -> MessengerBinding {
        MessengerBinding {
            address: ComponentAddress {
                scene_path: scene.path().to_string(),
                room: scene.room().to_string(),
                object_id: self.id,
                component_index: index,
            },
            transport: scene.context().transport.clone(),
            connection: self.owning_connection().map(|connection| connection.id()),
            debug: scene.context().debug_messages,
            component_kind: kind.to_string(),
        }
    }

    /// Refresh every component's wire binding against the current list
    /// positions, scene and owning connection.
    pub(crate) fn rebind_components(&self) {
        let Some(scene) = self.scene() else {
            return;
        };
        for (index, component) in self.components().iter().enumerate() {
            component.rebind(self.messenger_binding_for(
                &scene,
                index as ComponentIndex,
                component.kind(),
            ));
        }
    }

    // Notifications

    fn on_value_change(&self, change: ValueChange) {
        if self.is_destroyed() {
            return;
        }
        let event = match change {
            ValueChange::Transform => ObjectEvent::TransformChanged { id: self.id },
            ValueChange::DataSet(key) => ObjectEvent::DataChanged { id: self.id, key },
            ValueChange::DataRemoved(key) => ObjectEvent::DataRemoved { id: self.id, key },
        };
        self.bubble(event);
    }

    /// Propagate a notification up the parent chain; the scene handler at
    /// the root forwards it to scene-level listeners.
    pub(crate) fn bubble(&self, event: ObjectEvent) {
        let Some(mut root) = self.weak_self.upgrade() else {
            return;
        };
        while let Some(parent) = root.parent() {
            root = parent;
        }
        if let Some(scene) = root.scene() {
            scene.forward(&event);
        }
    }
}
