use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use sylva_shared::{DataValue, ObjectMessage, ReplicationDataMap, Tick};

use crate::{
    AssetError, AssetProvider, ComponentKinds, ComponentMessenger, Connection, ConnectionId,
    MessageTransport, ObjectComponent, ReplySender, Scene, SceneContext,
};


/// Shared log of component hook invocations, in firing order.
pub struct HookRecorder {
    events: Mutex<Vec<String>>,
}

impl HookRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// Component that logs every hook and snapshots a single `hp` field.
pub struct TestComponent {
    messenger: ComponentMessenger,
    log: Arc<HookRecorder>,
    pub hp: i64,
}

impl TestComponent {
    pub fn new(log: &Arc<HookRecorder>) -> Self {
        Self {
            messenger: ComponentMessenger::new(),
            log: log.clone(),
            hp: 0,
        }
    }

    pub fn with_hp(log: &Arc<HookRecorder>, hp: i64) -> Self {
        let mut component = Self::new(log);
        component.hp = hp;
        component
    }
}

impl ObjectComponent for TestComponent {
    fn kind(&self) -> &'static str {
        "test"
    }

    fn messenger(&self) -> &ComponentMessenger {
        &self.messenger
    }

    fn messenger_mut(&mut self) -> &mut ComponentMessenger {
        &mut self.messenger
    }

    fn init(&mut self) {
        self.log.record("init");
    }

    fn start(&mut self) {
        self.log.record("start");
    }

    fn enable(&mut self) {
        self.log.record("enable");
    }

    fn update(&mut self, tick: Tick) {
        self.log.record(format!("update:{tick}"));
    }

    fn disable(&mut self) {
        self.log.record("disable");
    }

    fn stop(&mut self) {
        self.log.record("stop");
    }

    fn destroy(&mut self) {
        self.log.record("destroy");
    }

    fn disconnect(&mut self, reason: &str, _args: &[DataValue]) {
        self.log.record(format!("disconnect:{reason}"));
    }

    fn handle_message(&mut self, message: &ObjectMessage, reply: &ReplySender) {
        self.log.record(format!("message:{}", message.kind_index));
        reply.reply(message.kind_index, b"ack".to_vec());
    }

    fn serialize(&self, data: &ReplicationDataMap) {
        let _ = data.set("hp", self.hp);
    }

    fn deserialize(&mut self, data: &ReplicationDataMap) {
        self.hp = data.get_i64("hp").unwrap_or(0);
    }
}

/// Transport that records every outbound message instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<(ConnectionId, ObjectMessage)>>,
    pub broadcasts: Mutex<Vec<ObjectMessage>>,
}

impl RecordingTransport {
    pub fn sent_snapshot(&self) -> Vec<(ConnectionId, ObjectMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn broadcast_snapshot(&self) -> Vec<ObjectMessage> {
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

/// In-memory asset provider.
#[derive(Default)]
pub struct MapAssets {
    assets: HashMap<String, String>,
}

impl MapAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, source: &str) {
        self.assets.insert(path.to_string(), source.to_string());
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

pub fn test_context(
    log: &Arc<HookRecorder>,
    transport: &Arc<RecordingTransport>,
    assets: MapAssets,
    debug_messages: bool,
) -> Arc<SceneContext> {
    let mut components = ComponentKinds::new();
    let factory_log = log.clone();
    components
        .add("test", move || Box::new(TestComponent::new(&factory_log)))
        .unwrap();
    Arc::new(SceneContext {
        assets: Arc::new(assets),
        components,
        transport: transport.clone(),
        debug_messages,
    })
}

pub fn simple_scene(path: &str) -> (Arc<Scene>, Arc<HookRecorder>, Arc<RecordingTransport>) {
    let log = HookRecorder::new();
    let transport = Arc::new(RecordingTransport::default());
    let context = test_context(&log, &transport, MapAssets::new(), false);
    (Scene::new(path, "lobby", context), log, transport)
}
