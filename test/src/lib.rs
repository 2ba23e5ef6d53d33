//! Shared helpers for the sylva integration suites: an in-memory asset
//! provider, a recording transport, a scripted test connection and a
//! hook-logging component.

use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sylva_server::{
    AssetError, AssetProvider, ComponentKinds, ComponentMessenger, Connection, ConnectionId,
    MessageTransport, ObjectComponent, ReplySender, Scene, SceneContext,
};
use sylva_shared::{DataValue, ObjectMessage, ReplicationDataMap, Tick};

/// Ordered log of component hook invocations.
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

/// A chest behavior: logs its lifecycle, carries a `gold` field through
/// serialize/deserialize, and acknowledges inbound messages.
pub struct ChestComponent {
    messenger: ComponentMessenger,
    log: Arc<EventLog>,
    pub gold: i64,
}

impl ChestComponent {
    pub fn new(log: &Arc<EventLog>) -> Self {
        Self {
            messenger: ComponentMessenger::new(),
            log: log.clone(),
            gold: 0,
        }
    }

    pub fn with_gold(log: &Arc<EventLog>, gold: i64) -> Self {
        let mut component = Self::new(log);
        component.gold = gold;
        component
    }
}

impl ObjectComponent for ChestComponent {
    fn kind(&self) -> &'static str {
        "chest"
    }

    fn messenger(&self) -> &ComponentMessenger {
        &self.messenger
    }

    fn messenger_mut(&mut self) -> &mut ComponentMessenger {
        &mut self.messenger
    }

    fn init(&mut self) {
        self.log.push("init");
    }

    fn start(&mut self) {
        self.log.push("start");
    }

    fn enable(&mut self) {
        self.log.push("enable");
    }

    fn update(&mut self, tick: Tick) {
        self.log.push(format!("update:{tick}"));
    }

    fn disable(&mut self) {
        self.log.push("disable");
    }

    fn stop(&mut self) {
        self.log.push("stop");
    }

    fn destroy(&mut self) {
        self.log.push("destroy");
    }

    fn disconnect(&mut self, reason: &str, _args: &[DataValue]) {
        self.log.push(format!("disconnect:{reason}"));
    }

    fn handle_message(&mut self, message: &ObjectMessage, reply: &ReplySender) {
        self.log.push(format!("message:{}", message.kind_index));
        reply.reply(message.kind_index, b"ok".to_vec());
    }

    fn serialize(&self, data: &ReplicationDataMap) {
        let _ = data.set("gold", self.gold);
    }

    fn deserialize(&mut self, data: &ReplicationDataMap) {
        self.gold = data.get_i64("gold").unwrap_or(0);
    }
}

/// Transport that records outbound traffic instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ConnectionId, ObjectMessage)>>,
    broadcasts: Mutex<Vec<ObjectMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<(ConnectionId, ObjectMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<ObjectMessage> {
        self.broadcasts.lock().unwrap().clone()
    }
}

impl MessageTransport for RecordingTransport {
    fn send_to(&self, connection: ConnectionId, message: &ObjectMessage) {
        self.sent.lock().unwrap().push((connection, message.clone()));
    }

    fn broadcast(&self, message: &ObjectMessage) {
        self.broadcasts.lock().unwrap().push(message.clone());
    }
}

/// In-memory asset provider for prefab definitions.
#[derive(Default)]
pub struct MapAssets {
    assets: HashMap<String, String>,
}

impl MapAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, source: &str) -> Self {
        self.assets.insert(path.to_string(), source.to_string());
        self
    }
}

impl AssetProvider for MapAssets {
    fn asset_string(&self, path: &str) -> Result<String, AssetError> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                path: path.to_string(),
            })
    }
}

/// A scripted client connection.
pub struct TestConnection {
    id: ConnectionId,
    open: AtomicBool,
}

impl TestConnection {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::from_u64(id),
            open: AtomicBool::new(true),
        })
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn Connection> {
        self.clone()
    }
}

impl Connection for TestConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Scene context with the `"chest"` component factory registered.
pub fn make_context(
    log: &Arc<EventLog>,
    transport: &Arc<RecordingTransport>,
    assets: MapAssets,
    debug_messages: bool,
) -> Arc<SceneContext> {
    let mut components = ComponentKinds::new();
    let factory_log = log.clone();
    components
        .add("chest", move || Box::new(ChestComponent::new(&factory_log)))
        .unwrap();
    Arc::new(SceneContext {
        assets: Arc::new(assets),
        components,
        transport: transport.clone(),
        debug_messages,
    })
}

/// A scene over empty assets, plus its log and transport.
pub fn make_scene(path: &str) -> (Arc<Scene>, Arc<EventLog>, Arc<RecordingTransport>) {
    let log = EventLog::new();
    let transport = Arc::new(RecordingTransport::default());
    let context = make_context(&log, &transport, MapAssets::new(), false);
    (Scene::new(path, "lobby", context), log, transport)
}
