use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::signal::{ChangeSender, ValueChange};

use super::error::ValueError;

/// A plain 3-component vector. Kept wire-neutral on purpose: the engine
/// replicates transforms, it does not do math on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Serde-level shape of a transform inside a prefab/scene definition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformDef {
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "TransformDef::unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
}

impl TransformDef {
    fn unit_scale() -> Vec3 {
        Vec3::ONE
    }
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
        }
    }
}

struct TransformInner {
    position: Vec3,
    scale: Vec3,
    rotation: Vec3,
    position_locked: bool,
    scale_locked: bool,
    rotation_locked: bool,
    locked: bool,
    sender: Option<ChangeSender>,
}

/// Position/scale/rotation triple owned by a scene object.
///
/// Cloning yields another handle onto the same shared state, so the owning
/// object and concurrent readers observe a single transform. Each vector can
/// be locked independently, and the whole transform can be locked; a write
/// against a locked target fails and changes nothing. Every successful write
/// raises a single transform-changed notification.
#[derive(Clone)]
pub struct Transform {
    inner: Arc<RwLock<TransformInner>>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(TransformInner {
                position: Vec3::ZERO,
                scale: Vec3::ONE,
                rotation: Vec3::ZERO,
                position_locked: false,
                scale_locked: false,
                rotation_locked: false,
                locked: false,
                sender: None,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TransformInner> {
        let Ok(inner) = self.inner.as_ref().read() else {
            panic!("Transform lock poisoned");
        };
        inner
    }

    fn write(&self) -> RwLockWriteGuard<'_, TransformInner> {
        let Ok(inner) = self.inner.as_ref().write() else {
            panic!("Transform lock poisoned");
        };
        inner
    }

    /// Install the change sender that reports writes to the owning object.
    pub fn set_sender(&self, sender: ChangeSender) {
        self.write().sender = Some(sender);
    }

    pub fn position(&self) -> Vec3 {
        self.read().position
    }

    pub fn scale(&self) -> Vec3 {
        self.read().scale
    }

    pub fn rotation(&self) -> Vec3 {
        self.read().rotation
    }

    pub fn set_position(&self, value: Vec3) -> Result<(), ValueError> {
        self.write_vector(value, VectorSlot::Position)
    }

    pub fn set_scale(&self, value: Vec3) -> Result<(), ValueError> {
        self.write_vector(value, VectorSlot::Scale)
    }

    pub fn set_rotation(&self, value: Vec3) -> Result<(), ValueError> {
        self.write_vector(value, VectorSlot::Rotation)
    }

    fn write_vector(&self, value: Vec3, slot: VectorSlot) -> Result<(), ValueError> {
        let sender = {
            let mut inner = self.write();
            if inner.locked {
                return Err(ValueError::ReadOnly { target: "transform" });
            }
            match slot {
                VectorSlot::Position => {
                    if inner.position_locked {
                        return Err(ValueError::ReadOnly { target: "transform position" });
                    }
                    inner.position = value;
                }
                VectorSlot::Scale => {
                    if inner.scale_locked {
                        return Err(ValueError::ReadOnly { target: "transform scale" });
                    }
                    inner.scale = value;
                }
                VectorSlot::Rotation => {
                    if inner.rotation_locked {
                        return Err(ValueError::ReadOnly { target: "transform rotation" });
                    }
                    inner.rotation = value;
                }
            }
            inner.sender.clone()
        };
        if let Some(sender) = sender {
            sender.raise(ValueChange::Transform);
        }
        Ok(())
    }

    /// Copy all three vectors from another transform, raising a single
    /// notification. Fails if any target vector is locked.
    pub fn mirror(&self, other: &Transform) -> Result<(), ValueError> {
        let (position, scale, rotation) = {
            let src = other.read();
            (src.position, src.scale, src.rotation)
        };
        let sender = {
            let mut inner = self.write();
            if inner.locked
                || inner.position_locked
                || inner.scale_locked
                || inner.rotation_locked
            {
                return Err(ValueError::ReadOnly { target: "transform" });
            }
            inner.position = position;
            inner.scale = scale;
            inner.rotation = rotation;
            inner.sender.clone()
        };
        if let Some(sender) = sender {
            sender.raise(ValueChange::Transform);
        }
        Ok(())
    }

    pub fn lock_position(&self) {
        self.write().position_locked = true;
    }

    pub fn lock_scale(&self) {
        self.write().scale_locked = true;
    }

    pub fn lock_rotation(&self) {
        self.write().rotation_locked = true;
    }

    /// Lock the transform as a whole.
    pub fn lock(&self) {
        self.write().locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.read().locked
    }

    pub fn is_position_locked(&self) -> bool {
        let inner = self.read();
        inner.locked || inner.position_locked
    }

    pub fn is_scale_locked(&self) -> bool {
        let inner = self.read();
        inner.locked || inner.scale_locked
    }

    pub fn is_rotation_locked(&self) -> bool {
        let inner = self.read();
        inner.locked || inner.rotation_locked
    }

    /// Deep copy with locks cleared and no sender attached.
    pub fn detached_copy(&self) -> Transform {
        let inner = self.read();
        let copy = Transform::new();
        {
            let mut dst = copy.write();
            dst.position = inner.position;
            dst.scale = inner.scale;
            dst.rotation = inner.rotation;
        }
        copy
    }

    /// Deep copy locked as a whole, for read-only views.
    pub fn locked_copy(&self) -> Transform {
        let copy = self.detached_copy();
        copy.lock();
        copy
    }

    pub fn def(&self) -> TransformDef {
        let inner = self.read();
        TransformDef {
            position: inner.position,
            scale: inner.scale,
            rotation: inner.rotation,
        }
    }

    pub fn apply_def(&self, def: &TransformDef) -> Result<(), ValueError> {
        self.set_position(def.position)?;
        self.set_scale(def.scale)?;
        self.set_rotation(def.rotation)?;
        Ok(())
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

enum VectorSlot {
    Position,
    Scale,
    Rotation,
}
