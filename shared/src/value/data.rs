use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::signal::{ChangeSender, ValueChange};

use super::error::ValueError;

/// An arbitrary scalar or binary value held in a replication data map.
#[derive(Clone, Debug, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl DataValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataValue::Bool(_) => "bool",
            DataValue::Int(_) => "int",
            DataValue::Float(_) => "float",
            DataValue::Text(_) => "text",
            DataValue::Blob(_) => "blob",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Float(value) => Some(*value),
            DataValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            DataValue::Blob(value) => Some(value),
            _ => None,
        }
    }

    /// Convert from a JSON value. Objects are handled one level up (they
    /// become shards); null and non-byte arrays have no representation.
    pub fn from_json(value: &serde_json::Value) -> Option<DataValue> {
        match value {
            serde_json::Value::Bool(value) => Some(DataValue::Bool(*value)),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Some(DataValue::Int(int))
                } else {
                    number.as_f64().map(DataValue::Float)
                }
            }
            serde_json::Value::String(text) => Some(DataValue::Text(text.clone())),
            serde_json::Value::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    let byte = item.as_u64().filter(|b| *b <= u8::MAX as u64)?;
                    bytes.push(byte as u8);
                }
                Some(DataValue::Blob(bytes))
            }
            serde_json::Value::Null | serde_json::Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DataValue::Bool(value) => serde_json::Value::Bool(*value),
            DataValue::Int(value) => serde_json::Value::from(*value),
            DataValue::Float(value) => serde_json::Value::from(*value),
            DataValue::Text(value) => serde_json::Value::String(value.clone()),
            DataValue::Blob(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
        }
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<Vec<u8>> for DataValue {
    fn from(value: Vec<u8>) -> Self {
        DataValue::Blob(value)
    }
}

/// Changes accumulated by a map since the last drain. One entry per key,
/// newest outcome wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataChanges {
    pub set: Vec<(String, DataValue)>,
    pub removed: Vec<String>,
}

impl DataChanges {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }

    fn note_set(&mut self, key: &str, value: DataValue) {
        self.set.retain(|(k, _)| k != key);
        self.removed.retain(|k| k != key);
        self.set.push((key.to_string(), value));
    }

    fn note_removed(&mut self, key: &str) {
        self.set.retain(|(k, _)| k != key);
        if !self.removed.iter().any(|k| k == key) {
            self.removed.push(key.to_string());
        }
    }
}

enum Slot {
    Value(DataValue),
    Shard(ReplicationDataMap),
}

struct DataMapInner {
    slots: HashMap<String, Slot>,
    read_only: bool,
    sender: Option<ChangeSender>,
    changes: DataChanges,
}

/// Change-tracked key/value store replicated alongside a scene object.
///
/// Cloning yields another handle onto the same shared store. Values are
/// scalars or blobs; a key may instead hold a nested sub-map ("shard").
/// Every successful `set`/`remove` raises a notification through the
/// installed change sender and is recorded in the drainable change set.
#[derive(Clone)]
pub struct ReplicationDataMap {
    inner: Arc<RwLock<DataMapInner>>,
}

impl std::fmt::Debug for ReplicationDataMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().unwrap();
        f.debug_struct("ReplicationDataMap")
            .field("read_only", &inner.read_only)
            .field("changes", &inner.changes)
            .finish()
    }
}

impl ReplicationDataMap {
    pub fn new() -> Self {
        Self::with_read_only(false)
    }

    fn with_read_only(read_only: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(DataMapInner {
                slots: HashMap::new(),
                read_only,
                sender: None,
                changes: DataChanges::default(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, DataMapInner> {
        let Ok(inner) = self.inner.as_ref().read() else {
            panic!("ReplicationDataMap lock poisoned");
        };
        inner
    }

    fn write(&self) -> RwLockWriteGuard<'_, DataMapInner> {
        let Ok(inner) = self.inner.as_ref().write() else {
            panic!("ReplicationDataMap lock poisoned");
        };
        inner
    }

    /// Install the change sender, recursively into existing shards.
    pub fn set_sender(&self, sender: ChangeSender) {
        let shards: Vec<ReplicationDataMap> = {
            let mut inner = self.write();
            inner.sender = Some(sender.clone());
            inner
                .slots
                .values()
                .filter_map(|slot| match slot {
                    Slot::Shard(shard) => Some(shard.clone()),
                    Slot::Value(_) => None,
                })
                .collect()
        };
        for shard in shards {
            shard.set_sender(sender.clone());
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read().read_only
    }

    /// Make this map (and every existing shard) read-only.
    pub fn lock(&self) {
        let shards: Vec<ReplicationDataMap> = {
            let mut inner = self.write();
            inner.read_only = true;
            inner
                .slots
                .values()
                .filter_map(|slot| match slot {
                    Slot::Shard(shard) => Some(shard.clone()),
                    Slot::Value(_) => None,
                })
                .collect()
        };
        for shard in shards {
            shard.lock();
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().slots.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().slots.keys().cloned().collect()
    }

    /// Plain value under `key`, if any. Shards return `None`.
    pub fn get(&self, key: &str) -> Option<DataValue> {
        match self.read().slots.get(key) {
            Some(Slot::Value(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| match v {
            DataValue::Text(text) => Some(text),
            _ => None,
        })
    }

    pub fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key).and_then(|v| match v {
            DataValue::Blob(bytes) => Some(bytes),
            _ => None,
        })
    }

    pub fn set(&self, key: &str, value: impl Into<DataValue>) -> Result<(), ValueError> {
        let value = value.into();
        let sender = {
            let mut inner = self.write();
            if inner.read_only {
                return Err(ValueError::ReadOnly { target: "replication data map" });
            }
            inner.slots.insert(key.to_string(), Slot::Value(value.clone()));
            inner.changes.note_set(key, value);
            inner.sender.clone()
        };
        if let Some(sender) = sender {
            sender.raise(ValueChange::DataSet(key.to_string()));
        }
        Ok(())
    }

    /// Remove `key`, returning the removed plain value (shards return
    /// `None` but are removed all the same).
    pub fn remove(&self, key: &str) -> Result<Option<DataValue>, ValueError> {
        let (removed, sender) = {
            let mut inner = self.write();
            if inner.read_only {
                return Err(ValueError::ReadOnly { target: "replication data map" });
            }
            let removed = inner.slots.remove(key);
            if removed.is_some() {
                inner.changes.note_removed(key);
            }
            (removed, inner.sender.clone())
        };
        if removed.is_none() {
            return Ok(None);
        }
        if let Some(sender) = sender {
            sender.raise(ValueChange::DataRemoved(key.to_string()));
        }
        match removed {
            Some(Slot::Value(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    /// Nested sub-map under `key`, created on first access. Fails if the key
    /// holds a plain value, or (for creation) if this map is read-only.
    pub fn shard(&self, key: &str) -> Result<ReplicationDataMap, ValueError> {
        let (shard, created, sender) = {
            let mut inner = self.write();
            match inner.slots.get(key) {
                Some(Slot::Shard(shard)) => (shard.clone(), false, None),
                Some(Slot::Value(_)) => {
                    return Err(ValueError::NotAShard { key: key.to_string() });
                }
                None => {
                    if inner.read_only {
                        return Err(ValueError::ReadOnly { target: "replication data map" });
                    }
                    let shard = ReplicationDataMap::new();
                    if let Some(sender) = &inner.sender {
                        shard.set_sender(sender.clone());
                    }
                    inner.slots.insert(key.to_string(), Slot::Shard(shard.clone()));
                    (shard, true, inner.sender.clone())
                }
            }
        };
        if created {
            if let Some(sender) = sender {
                sender.raise(ValueChange::DataSet(key.to_string()));
            }
        }
        Ok(shard)
    }

    /// Drain the changes accumulated since the last drain. Shard handles
    /// track their own changes.
    pub fn take_changes(&self) -> DataChanges {
        mem::take(&mut self.write().changes)
    }

    /// Immutable deep copy: read-only all the way down, no sender attached,
    /// no accumulated changes.
    pub fn snapshot(&self) -> ReplicationDataMap {
        self.deep_copy(true)
    }

    /// Independent mutable deep copy, no sender attached.
    pub fn writable_copy(&self) -> ReplicationDataMap {
        self.deep_copy(false)
    }

    fn deep_copy(&self, read_only: bool) -> ReplicationDataMap {
        let copy = ReplicationDataMap::with_read_only(false);
        {
            let src = self.read();
            let mut dst = copy.write();
            for (key, slot) in &src.slots {
                let copied = match slot {
                    Slot::Value(value) => Slot::Value(value.clone()),
                    Slot::Shard(shard) => Slot::Shard(shard.deep_copy(read_only)),
                };
                dst.slots.insert(key.clone(), copied);
            }
            dst.read_only = read_only;
        }
        copy
    }

    /// Replace this map's contents with a deep copy of another map's.
    pub fn mirror(&self, other: &ReplicationDataMap) -> Result<(), ValueError> {
        if self.is_read_only() {
            return Err(ValueError::ReadOnly { target: "replication data map" });
        }
        let copied = other.writable_copy();
        let mut dst = self.write();
        let src = copied.write();
        dst.slots.clear();
        let sender = dst.sender.clone();
        for (key, slot) in &src.slots {
            let slot = match slot {
                Slot::Value(value) => Slot::Value(value.clone()),
                Slot::Shard(shard) => {
                    if let Some(sender) = &sender {
                        shard.set_sender(sender.clone());
                    }
                    Slot::Shard(shard.clone())
                }
            };
            dst.slots.insert(key.clone(), slot);
        }
        Ok(())
    }

    /// Build a map from a JSON object: nested objects become shards, every
    /// other value must be representable as a `DataValue`.
    pub fn from_json_map(
        source: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<ReplicationDataMap, ValueError> {
        let map = ReplicationDataMap::new();
        {
            let mut inner = map.write();
            for (key, value) in source {
                let slot = match value {
                    serde_json::Value::Object(nested) => {
                        Slot::Shard(ReplicationDataMap::from_json_map(nested)?)
                    }
                    other => Slot::Value(
                        DataValue::from_json(other)
                            .ok_or_else(|| ValueError::UnsupportedJson { key: key.clone() })?,
                    ),
                };
                inner.slots.insert(key.clone(), slot);
            }
        }
        Ok(map)
    }

    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let inner = self.read();
        let mut out = serde_json::Map::new();
        for (key, slot) in &inner.slots {
            let value = match slot {
                Slot::Value(value) => value.to_json(),
                Slot::Shard(shard) => serde_json::Value::Object(shard.to_json_map()),
            };
            out.insert(key.clone(), value);
        }
        out
    }
}

impl Default for ReplicationDataMap {
    fn default() -> Self {
        Self::new()
    }
}
