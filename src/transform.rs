//! Spatial transform with a cached world matrix
//!
//! A plain value type holding translation, Euler rotation and scale, meant
//! to be embedded in whatever needs a pose (camera, model instance) rather
//! than inherited from. The combined matrix is cached behind an explicit
//! dirty bit and recomputed on read, so repeated reads within a frame cost
//! one matrix multiply at most.

use std::cell::Cell;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

fn dirty_cell() -> Cell<bool> {
    Cell::new(true)
}

/// Position / rotation / scale with a lazily recomputed matrix.
///
/// Rotation is in radians and applied in the order X, -Y, Z, matching the
/// screen-space handedness of the projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,

    #[serde(skip)]
    matrix: Cell<Mat4>,
    #[serde(skip, default = "dirty_cell")]
    dirty: Cell<bool>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(false),
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.dirty.set(true);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty.set(true);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty.set(true);
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
        self.dirty.set(true);
    }

    /// Add Euler angles (radians) to the current rotation.
    pub fn rotate(&mut self, angles: Vec3) {
        self.rotation += angles;
        self.dirty.set(true);
    }

    pub fn scale_by(&mut self, factor: Vec3) {
        self.scale *= factor;
        self.dirty.set(true);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// The combined translation * rotation * scale matrix, recomputed only
    /// when a setter has run since the last read.
    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            let rotation = Mat4::from_rotation_x(self.rotation.x)
                * Mat4::from_rotation_y(-self.rotation.y)
                * Mat4::from_rotation_z(self.rotation.z);

            let combined = Mat4::from_translation(self.position) * rotation * Mat4::from_scale(self.scale);

            self.matrix.set(combined);
            self.dirty.set(false);
        }

        self.matrix.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
