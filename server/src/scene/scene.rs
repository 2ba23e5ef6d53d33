use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

use log::{info, warn};

use sylva_shared::{DataValue, ObjectId, ObjectMessage, Tick};

use crate::asset::AssetProvider;
use crate::connection::{Connection, ConnectionId};
use crate::transport::{MessageTransport, ReplySender};

use super::component::ComponentKinds;
use super::deltas::SceneDeltas;
use super::events::{ObjectEvent, SceneListener};
use super::object::{ObjectError, SceneObject};
use super::prefab::{self, PrefabError};

/// Collaborators shared by every scene a server manages: where prefab
/// definitions come from, which component factories exist, where messages
/// go, and whether outbound messages carry diagnostic headers.
pub struct SceneContext {
    pub assets: Arc<dyn AssetProvider>,
    pub components: ComponentKinds,
    pub transport: Arc<dyn MessageTransport>,
    pub debug_messages: bool,
}

/// The root container of an object-tree forest.
///
/// Owns the root set, an id index over every object in the scene, the
/// per-tick structural delta sets, and the scene-level listeners that
/// receive bubbled notifications. Performs no network I/O itself.
pub struct Scene {
    path: String,
    room: String,
    context: Arc<SceneContext>,
    weak_self: Weak<Scene>,
    objects: RwLock<Vec<Arc<SceneObject>>>,
    index: RwLock<HashMap<ObjectId, Weak<SceneObject>>>,
    deltas: Mutex<SceneDeltas>,
    listeners: RwLock<Vec<Arc<dyn SceneListener>>>,
}

impl Scene {
    pub fn new(path: &str, room: &str, context: Arc<SceneContext>) -> Arc<Scene> {
        Arc::new_cyclic(|weak: &Weak<Scene>| Scene {
            path: path.to_string(),
            room: room.to_string(),
            context,
            weak_self: weak.clone(),
            objects: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::new()),
            deltas: Mutex::new(SceneDeltas::default()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Logical partition scoping which connections receive this scene's
    /// updates; opaque to the scene graph.
    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn context(&self) -> &Arc<SceneContext> {
        &self.context
    }

    fn arc(&self) -> Option<Arc<Scene>> {
        self.weak_self.upgrade()
    }

    fn deltas_lock(&self) -> MutexGuard<'_, SceneDeltas> {
        let Ok(deltas) = self.deltas.lock() else {
            panic!("Scene deltas lock poisoned");
        };
        deltas
    }

    // Spawning & membership

    /// Load a prefab definition through the asset provider, build its
    /// subtree, attach it as a root of this scene and record the spawn.
    pub fn spawn_prefab(&self, asset_path: &str) -> Result<Arc<SceneObject>, PrefabError> {
        let source = self.context.assets.asset_string(asset_path)?;
        let def = prefab::parse_def(&source)?;
        let object = prefab::build_object(&def, &self.context.components)?;
        if let Some(scene) = self.arc() {
            object.place_in_scene(&scene);
        }
        self.deltas_lock()
            .spawned_prefabs
            .push((object.id(), asset_path.to_string()));
        info!(
            "scene {:?} spawned prefab {:?} as {}",
            self.path,
            asset_path,
            object.id()
        );
        Ok(object)
    }

    /// Make an existing object a root of this scene.
    pub fn adopt(&self, object: &Arc<SceneObject>) -> Result<(), ObjectError> {
        match self.arc() {
            Some(scene) => object.set_scene(&scene),
            None => Ok(()),
        }
    }

    /// Snapshot of the current root set.
    pub fn objects(&self) -> Vec<Arc<SceneObject>> {
        let Ok(objects) = self.objects.read() else {
            panic!("Scene objects lock poisoned");
        };
        objects.clone()
    }

    pub fn objects_count(&self) -> usize {
        let Ok(objects) = self.objects.read() else {
            panic!("Scene objects lock poisoned");
        };
        objects.len()
    }

    /// Any object in the scene, root or not.
    pub fn object_by_id(&self, id: ObjectId) -> Option<Arc<SceneObject>> {
        let Ok(index) = self.index.read() else {
            panic!("Scene index lock poisoned");
        };
        index.get(&id).and_then(Weak::upgrade)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object_by_id(id).is_some()
    }

    // Ticking

    /// Drive `update` on every enabled component of every live object.
    pub fn tick(&self, tick: Tick) {
        fn walk(object: &Arc<SceneObject>, tick: Tick) {
            for component in object.components() {
                component.update(tick);
            }
            for child in object.children() {
                walk(&child, tick);
            }
        }
        for root in self.objects() {
            walk(&root, tick);
        }
    }

    /// Consistent snapshot-and-clear of the structural deltas accumulated
    /// since the last drain.
    pub fn drain_deltas(&self) -> SceneDeltas {
        mem::take(&mut *self.deltas_lock())
    }

    // Inbound routing

    /// Route an inbound message to its target component, handing it a reply
    /// sender bound to the originating connection. A message racing a
    /// destroy resolves to a not-found error, never a crash.
    pub fn deliver(&self, message: &ObjectMessage, from: ConnectionId) -> Result<(), ObjectError> {
        let id = message.address.object_id;
        let Some(object) = self.object_by_id(id) else {
            warn!("scene {:?} dropped message for unknown {}", self.path, id);
            return Err(ObjectError::ObjectNotFound {
                id,
                scene_path: self.path.clone(),
            });
        };
        let component = object.component_at(message.address.component_index)?;
        let reply = ReplySender::new(
            self.context.transport.clone(),
            from,
            message.address.clone(),
        );
        component.handle_message(message, &reply);
        Ok(())
    }

    /// React to a connection closing: every component on every object whose
    /// resolved owning connection matches gets its disconnect hook, down
    /// through the children.
    pub fn handle_disconnect(&self, connection: ConnectionId, reason: &str, args: &[DataValue]) {
        fn walk(
            object: &Arc<SceneObject>,
            connection: ConnectionId,
            reason: &str,
            args: &[DataValue],
        ) {
            let owned = object
                .owning_connection()
                .map(|owner| owner.id())
                == Some(connection);
            if owned {
                for component in object.components() {
                    component.disconnect(reason, args);
                }
            }
            for child in object.children() {
                walk(&child, connection, reason, args);
            }
        }
        info!(
            "scene {:?} handling disconnect of {} ({})",
            self.path, connection, reason
        );
        for root in self.objects() {
            walk(&root, connection, reason, args);
        }
    }

    // Listeners

    pub fn add_listener(&self, listener: Arc<dyn SceneListener>) {
        let Ok(mut listeners) = self.listeners.write() else {
            panic!("Scene listeners lock poisoned");
        };
        listeners.push(listener);
    }

    /// Hand a notification that bubbled to a root over to the scene-level
    /// listeners.
    pub(crate) fn forward(&self, event: &ObjectEvent) {
        let listeners = {
            let Ok(listeners) = self.listeners.read() else {
                panic!("Scene listeners lock poisoned");
            };
            listeners.clone()
        };
        for listener in listeners {
            listener.on_event(event);
        }
    }

    // Root-set & index bookkeeping (objects call these during structural
    // mutations; the root set holds exactly the parentless objects)

    pub(crate) fn add_root(&self, object: &Arc<SceneObject>) {
        let Ok(mut objects) = self.objects.write() else {
            panic!("Scene objects lock poisoned");
        };
        if !objects.iter().any(|entry| entry.id() == object.id()) {
            objects.push(object.clone());
        }
    }

    pub(crate) fn remove_root(&self, object: &Arc<SceneObject>) {
        let Ok(mut objects) = self.objects.write() else {
            panic!("Scene objects lock poisoned");
        };
        objects.retain(|entry| entry.id() != object.id());
    }

    pub(crate) fn index_object(&self, object: &Arc<SceneObject>) {
        let Ok(mut index) = self.index.write() else {
            panic!("Scene index lock poisoned");
        };
        index.insert(object.id(), Arc::downgrade(object));
    }

    pub(crate) fn unindex_object(&self, id: ObjectId) {
        let Ok(mut index) = self.index.write() else {
            panic!("Scene index lock poisoned");
        };
        index.remove(&id);
    }

    pub(crate) fn note_reparented(&self, id: ObjectId) {
        let mut deltas = self.deltas_lock();
        if !deltas.reparented.contains(&id) {
            deltas.reparented.push(id);
        }
    }

    pub(crate) fn note_entered(&self, id: ObjectId) {
        let mut deltas = self.deltas_lock();
        if !deltas.entered.contains(&id) {
            deltas.entered.push(id);
        }
    }

    pub(crate) fn note_destroyed(&self, id: ObjectId) {
        let mut deltas = self.deltas_lock();
        if !deltas.destroyed.contains(&id) {
            deltas.destroyed.push(id);
        }
    }
}
