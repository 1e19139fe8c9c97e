//! Per-triangle render packet
//!
//! Everything the pixel kernel needs for one triangle, computed once during
//! geometry processing and cloned into the queue of every tile the triangle
//! touches. Edge values are seeded at the clipped box origin; a tile
//! re-derives its own seed with one multiply-add per edge, so the packet
//! itself is position-independent.

use std::sync::Arc;

use glam::{IVec2, Vec2, Vec4};

use crate::bounds::BoundingBox;
use crate::color::Color;
use crate::model::Image;

#[derive(Clone)]
pub struct RenderTriangle {
    /// Clip-space positions, before the perspective divide.
    pub clip: [Vec4; 3],
    pub colors: [Color; 3],
    pub uvs: [Vec2; 3],
    pub diffuse: Option<Arc<Image>>,

    /// Twice the signed screen-space area, positive for front faces.
    pub area: i32,
    /// Top-left fill-rule bias per edge, 0 or -1.
    pub bias: [i32; 3],
    /// Edge values at the screen-clipped box origin.
    pub w_origin: [i32; 3],
    /// Per-edge steps: `x` per pixel right, `y` per pixel down.
    pub delta_w: [IVec2; 3],
    /// Triangle bounds clipped to the surface, non-empty.
    pub bounds: BoundingBox,
}

impl RenderTriangle {
    /// Edge seeds at `pos`, re-derived from the box-origin seeds. Exact for
    /// any `pos` because the edge function is affine in integer space.
    #[inline]
    pub fn edges_at(&self, pos: IVec2) -> [i32; 3] {
        let offset = pos - self.bounds.min;
        let mut w = [0i32; 3];
        for e in 0..3 {
            w[e] = self.w_origin[e]
                + self.delta_w[e].x * offset.x
                + self.delta_w[e].y * offset.y;
        }
        w
    }
}
