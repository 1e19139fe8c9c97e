//! Mesh-level scene data
//!
//! Models are immutable after construction and shared read-only across
//! frames and tile queues via `Arc`. Asset parsing lives outside this core;
//! constructors take already-decoded data.

use std::sync::Arc;

use glam::{IVec2, Vec2, Vec3};

use crate::color::Color;
use crate::error::fatal;
use crate::transform::Transform;

/// A mesh vertex: position plus the blended flat-shading color.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Color,
}

impl Vertex {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self { position, color }
    }
}

/// A mesh triangle: three indices into the owning model's vertex array,
/// per-vertex UVs and normals, and an optional diffuse image.
#[derive(Debug, Clone, Default)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub uvs: [Vec2; 3],
    pub normals: [Vec3; 3],
    pub diffuse: Option<Arc<Image>>,
}

/// An immutable mesh.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

/// A model placed in the world.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub model: Arc<Model>,
    pub transform: Transform,
}

impl ModelInstance {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            transform: Transform::new(),
        }
    }
}

/// An ordered set of instances to draw. Iteration order does not affect the
/// final image beyond exact depth ties.
#[derive(Default)]
pub struct Scene {
    pub instances: Vec<ModelInstance>,
}

/// A decoded RGBA image used for diffuse sampling.
///
/// Sampling is unclamped truncating lookup; callers keep UVs inside `[0, 1)`
/// (the asset layer wraps them at load time).
#[derive(Debug)]
pub struct Image {
    size: IVec2,
    pixels: Vec<u32>,
}

impl Image {
    /// Wrap decoded RGBA bytes, 4 per pixel, row-major.
    pub fn from_rgba(size: IVec2, bytes: &[u8]) -> Self {
        let expected = (size.x * size.y) as usize * 4;
        if size.x <= 0 || size.y <= 0 || bytes.len() != expected {
            fatal(&format!(
                "Invalid image data: size {}x{}, {} bytes",
                size.x,
                size.y,
                bytes.len()
            ));
        }

        Self {
            size,
            // pod_collect_to_vec, not cast_slice: the byte source has no
            // alignment guarantee.
            pixels: bytemuck::pod_collect_to_vec(bytes),
        }
    }

    /// A single-color image, mostly useful in tests.
    pub fn solid(size: IVec2, color: Color) -> Self {
        Self {
            size,
            pixels: vec![color.to_word(); (size.x * size.y) as usize],
        }
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    #[inline]
    pub fn get_pixel(&self, pos: IVec2) -> Color {
        Color::from_word(self.pixels[(pos.y * self.size.x + pos.x) as usize])
    }
}
