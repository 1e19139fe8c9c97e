//! Camera
//!
//! A perspective camera as a plain value: a [`Transform`] pose plus the
//! projection parameters. The rasterizer rebuilds its projection and view
//! matrices whenever a camera is (re)assigned.

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub transform: Transform,

    fov: f32,
    z_near: f32,
    z_far: f32,
}

impl Camera {
    /// Vertical field of view in degrees.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    pub fn set_planes(&mut self, z_near: f32, z_far: f32) {
        self.z_near = z_near;
        self.z_far = z_far;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::new(),
            fov: 70.0,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}
