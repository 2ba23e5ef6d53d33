pub mod error;
mod messenger;
mod registry;

pub use error::{ComponentKindsError, MessengerError};
pub use messenger::ComponentMessenger;
pub use registry::ComponentKinds;

pub(crate) use messenger::MessengerBinding;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sylva_shared::{DataValue, ObjectMessage, ReplicationDataMap, Tick};

use crate::transport::ReplySender;

/// User-attachable behavior on a scene object.
///
/// Implementations embed a [`ComponentMessenger`] and expose it through
/// `messenger`/`messenger_mut`; the engine seals the message registry and
/// binds addressing when the owning object enters a scene. Lifecycle hooks
/// default to no-ops so components implement only what they need.
pub trait ObjectComponent: Send + Sync {
    /// Stable registry name of this component kind.
    fn kind(&self) -> &'static str;

    fn messenger(&self) -> &ComponentMessenger;

    fn messenger_mut(&mut self) -> &mut ComponentMessenger;

    /// Fired once per instance, the first time its object enters a scene.
    fn init(&mut self) {}

    /// Fired on every scene entry.
    fn start(&mut self) {}

    /// Fired when the object's active flag turns on (and on scene entry of
    /// an active object).
    fn enable(&mut self) {}

    /// Fired once per server tick while enabled in a live scene.
    fn update(&mut self, _tick: Tick) {}

    /// Fired when the object's active flag turns off.
    fn disable(&mut self) {}

    /// Fired on every scene exit.
    fn stop(&mut self) {}

    /// Terminal hook; fired exactly once when the object (or this
    /// attachment) is destroyed.
    fn destroy(&mut self) {}

    /// Fired when the object's owning connection disconnects.
    fn disconnect(&mut self, _reason: &str, _args: &[DataValue]) {}

    /// Inbound message routed to this component by the transport layer.
    fn handle_message(&mut self, _message: &ObjectMessage, _reply: &ReplySender) {}

    /// Write a plain snapshot of component state, used by prefab saving and
    /// by reflection unlock.
    fn serialize(&self, _data: &ReplicationDataMap) {}

    /// Restore component state from a snapshot, used by prefab loading and
    /// by reflection unlock.
    fn deserialize(&mut self, _data: &ReplicationDataMap) {}
}

/// Lifecycle of an attached component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unattached,
    Initialized,
    Started,
    Enabled,
    Disabled,
    Stopped,
    Destroyed,
}

/// A component attached to a scene object: the boxed behavior plus the
/// per-attachment lifecycle bookkeeping the engine drives.
pub struct AttachedComponent {
    kind: String,
    inner: RwLock<Box<dyn ObjectComponent>>,
    state: RwLock<Lifecycle>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for AttachedComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedComponent")
            .field("kind", &self.kind)
            .field("state", &*self.state.read().unwrap())
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish()
    }
}

impl AttachedComponent {
    pub(crate) fn new(component: Box<dyn ObjectComponent>) -> Self {
        Self {
            kind: component.kind().to_string(),
            inner: RwLock::new(component),
            state: RwLock::new(Lifecycle::Unattached),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.read_state()
    }

    /// Read access to the boxed component, for inspection and snapshots.
    pub fn with_component<R>(&self, f: impl FnOnce(&dyn ObjectComponent) -> R) -> R {
        let inner = self.read_inner();
        f(inner.as_ref())
    }

    /// Write access to the boxed component.
    pub fn with_component_mut<R>(&self, f: impl FnOnce(&mut dyn ObjectComponent) -> R) -> R {
        let mut inner = self.write_inner();
        f(inner.as_mut())
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, Box<dyn ObjectComponent>> {
        let Ok(inner) = self.inner.read() else {
            panic!("AttachedComponent lock poisoned");
        };
        inner
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, Box<dyn ObjectComponent>> {
        let Ok(inner) = self.inner.write() else {
            panic!("AttachedComponent lock poisoned");
        };
        inner
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Lifecycle> {
        let Ok(state) = self.state.read() else {
            panic!("AttachedComponent state lock poisoned");
        };
        state
    }

    fn set_state(&self, state: Lifecycle) {
        let Ok(mut slot) = self.state.write() else {
            panic!("AttachedComponent state lock poisoned");
        };
        *slot = state;
    }

    /// Scene entry: seal + bind the messenger, then Init (first entry only),
    /// Start, and Enable when the object is active.
    pub(crate) fn enter_scene(&self, binding: MessengerBinding, active: bool) {
        {
            let mut inner = self.write_inner();
            let messenger = inner.messenger_mut();
            messenger.seal();
            messenger.bind(binding);
        }
        if !self.initialized.swap(true, Ordering::SeqCst) {
            self.write_inner().init();
            self.set_state(Lifecycle::Initialized);
        }
        self.write_inner().start();
        self.set_state(Lifecycle::Started);
        if active {
            self.write_inner().enable();
            self.set_state(Lifecycle::Enabled);
        }
    }

    /// Scene exit: Disable if enabled, Stop, drop the binding. Init is not
    /// refired on a later re-entry.
    pub(crate) fn exit_scene(&self) {
        let state = self.lifecycle();
        if state == Lifecycle::Enabled {
            self.write_inner().disable();
        }
        if matches!(state, Lifecycle::Started | Lifecycle::Enabled | Lifecycle::Disabled) {
            self.write_inner().stop();
            self.set_state(Lifecycle::Stopped);
        }
        self.read_inner().messenger().unbind();
    }

    /// Track the owning object's active flag.
    pub(crate) fn set_enabled(&self, enabled: bool) {
        let state = self.lifecycle();
        if enabled && matches!(state, Lifecycle::Started | Lifecycle::Disabled) {
            self.write_inner().enable();
            self.set_state(Lifecycle::Enabled);
        } else if !enabled && state == Lifecycle::Enabled {
            self.write_inner().disable();
            self.set_state(Lifecycle::Disabled);
        }
    }

    pub(crate) fn update(&self, tick: Tick) {
        if self.lifecycle() == Lifecycle::Enabled {
            self.write_inner().update(tick);
        }
    }

    /// Terminal teardown: Disable if enabled, Stop if started, Destroy.
    pub(crate) fn teardown(&self) {
        let state = self.lifecycle();
        if state == Lifecycle::Destroyed {
            return;
        }
        if state == Lifecycle::Enabled {
            self.write_inner().disable();
        }
        if matches!(state, Lifecycle::Started | Lifecycle::Enabled | Lifecycle::Disabled) {
            self.write_inner().stop();
        }
        self.write_inner().destroy();
        self.read_inner().messenger().unbind();
        self.set_state(Lifecycle::Destroyed);
    }

    pub(crate) fn rebind(&self, binding: MessengerBinding) {
        self.read_inner().messenger().bind(binding);
    }

    pub(crate) fn handle_message(&self, message: &ObjectMessage, reply: &ReplySender) {
        self.write_inner().handle_message(message, reply);
    }

    pub(crate) fn disconnect(&self, reason: &str, args: &[DataValue]) {
        self.write_inner().disconnect(reason, args);
    }

    pub(crate) fn serialize_into(&self, data: &ReplicationDataMap) {
        self.read_inner().serialize(data);
    }
}
