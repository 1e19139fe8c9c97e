//! The pixel kernel
//!
//! Walks a triangle's clipped box inside one tile, row by row, testing
//! coverage with integer edge functions and shading covered pixels with
//! barycentric interpolation. The kernel is generic over [`Lanes`]: rows are
//! consumed in vector-width groups with a scalar tail, and every float is
//! produced by the same IEEE operations in the same order at every width.
//!
//! Rows exploit convexity: after the first covered pixel, the first fully
//! uncovered group ends the row.

use glam::{IVec2, Vec2};

use crate::bounds::BoundingBox;
use crate::color::Color;
use crate::model::Image;
use crate::packet::RenderTriangle;
use crate::simd::{Lanes, Scalar, MAX_LANES};
use crate::surface::TileView;

enum RowState {
    Continue,
    Done,
}

/// `a * v0 + b * v1 + g * v2` across the lanes.
#[inline]
fn interpolate<L: Lanes>(a: L::F32, b: L::F32, g: L::F32, v: [f32; 3]) -> L::F32 {
    L::add_f32(
        L::add_f32(
            L::mul_f32(a, L::splat_f32(v[0])),
            L::mul_f32(b, L::splat_f32(v[1])),
        ),
        L::mul_f32(g, L::splat_f32(v[2])),
    )
}

pub struct PixelProcessor<'a> {
    view: &'a mut TileView,
    tri: &'a RenderTriangle,
    tile_box: BoundingBox,

    area: f32,
    clip_z: [f32; 3],
    /// Vertex color channels as floats, `[r, g, b, a]` by `[v0, v1, v2]`.
    channels: [[f32; 3]; 4],

    texture: Option<&'a Image>,
    texture_size: Vec2,
    inv_w: [f32; 3],
    uv_over_w: [Vec2; 3],
}

impl<'a> PixelProcessor<'a> {
    /// Set up for one triangle within one tile. `tile_box` is the triangle's
    /// clipped box intersected with the tile, non-empty.
    pub fn new(view: &'a mut TileView, tri: &'a RenderTriangle, tile_box: BoundingBox) -> Self {
        let texture = tri.diffuse.as_deref();
        let texture_size = texture
            .map(|t| t.size().as_vec2())
            .unwrap_or(Vec2::ZERO);

        let mut inv_w = [0.0f32; 3];
        let mut uv_over_w = [Vec2::ZERO; 3];
        let mut channels = [[0.0f32; 3]; 4];

        for v in 0..3 {
            inv_w[v] = 1.0 / tri.clip[v].w;
            uv_over_w[v] = tri.uvs[v] / tri.clip[v].w;

            let bytes = tri.colors[v].to_bytes();
            for c in 0..4 {
                channels[c][v] = bytes[c] as f32;
            }
        }

        Self {
            view,
            tri,
            tile_box,
            area: tri.area as f32,
            clip_z: [tri.clip[0].z, tri.clip[1].z, tri.clip[2].z],
            channels,
            texture,
            texture_size,
            inv_w,
            uv_over_w,
        }
    }

    /// Rasterize the tile box at lane width `L`.
    pub fn run<L: Lanes>(&mut self) {
        let mut w_row = self.tri.edges_at(self.tile_box.min);

        for y in self.tile_box.min.y..self.tile_box.max.y {
            self.scan_row::<L>(y, w_row);

            for e in 0..3 {
                w_row[e] += self.tri.delta_w[e].y;
            }
        }
    }

    fn scan_row<L: Lanes>(&mut self, y: i32, w_row: [i32; 3]) {
        let min_x = self.tile_box.min.x;
        let max_x = self.tile_box.max.x;
        let delta = self.tri.delta_w;

        let mut was_inside = false;
        let mut x = min_x;

        let mut w: [L::I32; 3] = [
            L::add_i32(L::splat_i32(w_row[0]), L::ramp_i32(delta[0].x)),
            L::add_i32(L::splat_i32(w_row[1]), L::ramp_i32(delta[1].x)),
            L::add_i32(L::splat_i32(w_row[2]), L::ramp_i32(delta[2].x)),
        ];
        let step: [L::I32; 3] = [
            L::splat_i32(delta[0].x * L::WIDTH as i32),
            L::splat_i32(delta[1].x * L::WIDTH as i32),
            L::splat_i32(delta[2].x * L::WIDTH as i32),
        ];

        while x + L::WIDTH as i32 <= max_x {
            if let RowState::Done = self.step_group::<L>(x, y, &w, &mut was_inside) {
                return;
            }

            for e in 0..3 {
                w[e] = L::add_i32(w[e], step[e]);
            }
            x += L::WIDTH as i32;
        }

        // Scalar tail for the pixels a full group no longer fits.
        let mut ws = [0i32; 3];
        for e in 0..3 {
            ws[e] = w_row[e] + delta[e].x * (x - min_x);
        }

        while x < max_x {
            if let RowState::Done = self.step_group::<Scalar>(x, y, &ws, &mut was_inside) {
                return;
            }

            for e in 0..3 {
                ws[e] += delta[e].x;
            }
            x += 1;
        }
    }

    /// Test and shade `L::WIDTH` pixels starting at `(x, y)`.
    fn step_group<L: Lanes>(
        &mut self,
        x: i32,
        y: i32,
        w: &[L::I32; 3],
        was_inside: &mut bool,
    ) -> RowState {
        let covered = L::or_i32(
            L::or_i32(
                L::add_i32(w[0], L::splat_i32(self.tri.bias[0])),
                L::add_i32(w[1], L::splat_i32(self.tri.bias[1])),
            ),
            L::add_i32(w[2], L::splat_i32(self.tri.bias[2])),
        );
        let mask = L::nonneg_mask(covered);

        if mask == 0 {
            return if *was_inside {
                RowState::Done
            } else {
                RowState::Continue
            };
        }

        let area = L::splat_f32(self.area);
        let a = L::div_f32(L::to_f32(w[0]), area);
        let b = L::div_f32(L::to_f32(w[1]), area);
        let g = L::div_f32(L::to_f32(w[2]), area);

        let mut zs = [0.0f32; MAX_LANES];
        L::store_f32(interpolate::<L>(a, b, g, self.clip_z), &mut zs);

        let mut us = [0.0f32; MAX_LANES];
        let mut vs = [0.0f32; MAX_LANES];
        let mut rgba = [[0.0f32; MAX_LANES]; 4];

        if self.texture.is_some() {
            // Perspective-correct UVs: interpolate uv/w and 1/w, then divide.
            let w_t = interpolate::<L>(a, b, g, self.inv_w);
            let u = L::div_f32(
                interpolate::<L>(
                    a,
                    b,
                    g,
                    [self.uv_over_w[0].x, self.uv_over_w[1].x, self.uv_over_w[2].x],
                ),
                w_t,
            );
            let v = L::div_f32(
                interpolate::<L>(
                    a,
                    b,
                    g,
                    [self.uv_over_w[0].y, self.uv_over_w[1].y, self.uv_over_w[2].y],
                ),
                w_t,
            );
            L::store_f32(u, &mut us);
            L::store_f32(v, &mut vs);
        } else {
            for (c, out) in rgba.iter_mut().enumerate() {
                L::store_f32(interpolate::<L>(a, b, g, self.channels[c]), out);
            }
        }

        for i in 0..L::WIDTH {
            if mask & (1 << i) != 0 {
                *was_inside = true;

                let pos = IVec2::new(x + i as i32, y);
                let z = zs[i];

                if z < self.view.depth_at(pos) {
                    self.view.set_depth(pos, z);

                    let color = if let Some(texture) = self.texture {
                        let t = IVec2::new(
                            (us[i] * self.texture_size.x) as i32,
                            (vs[i] * self.texture_size.y) as i32,
                        );
                        texture.get_pixel(t)
                    } else {
                        Color::rgba(
                            rgba[0][i].round() as u8,
                            rgba[1][i].round() as u8,
                            rgba[2][i].round() as u8,
                            rgba[3][i].round() as u8,
                        )
                    };

                    self.view.set_pixel(pos, color);
                }
            } else if *was_inside {
                return RowState::Done;
            }
        }

        RowState::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{X4, X8};
    use crate::surface::RenderTarget;
    use glam::{ivec2, vec2, Vec4};
    use std::sync::Arc;

    // Screen-space right triangle (0,0) (8,0) (0,8), area 64, built with the
    // same edge setup geometry processing produces: w0 seeded from edge
    // v1->v2 (the hypotenuse, neither top nor left), w1 from v2->v0 (left),
    // w2 from v0->v1 (top).
    fn test_triangle(diffuse: Option<Arc<Image>>) -> RenderTriangle {
        RenderTriangle {
            clip: [
                Vec4::new(0.0, 0.0, 0.5, 1.0),
                Vec4::new(8.0, 0.0, 0.5, 1.0),
                Vec4::new(0.0, 8.0, 0.5, 1.0),
            ],
            colors: [Color::WHITE; 3],
            uvs: [vec2(0.0, 0.0), vec2(0.9, 0.0), vec2(0.0, 0.9)],
            diffuse,
            area: 64,
            bias: [-1, 0, 0],
            w_origin: [64, 0, 0],
            delta_w: [ivec2(-8, -8), ivec2(8, 0), ivec2(0, 8)],
            bounds: BoundingBox {
                min: ivec2(0, 0),
                max: ivec2(8, 8),
            },
        }
    }

    fn render<L: Lanes>(tri: &RenderTriangle) -> RenderTarget {
        let mut target = RenderTarget::default();
        target.create(ivec2(8, 8));
        let mut view = target.tile_view();
        PixelProcessor::new(&mut view, tri, tri.bounds).run::<L>();
        target
    }

    fn assert_fill_rule_coverage(target: &RenderTarget) {
        for y in 0..8 {
            for x in 0..8 {
                let inside = x + y <= 7;
                let pixel = target.frame.get_pixel(ivec2(x, y));
                let expected = if inside { Color::WHITE } else { Color::from_word(0) };
                assert_eq!(pixel, expected, "({x}, {y})");

                if inside {
                    assert_eq!(target.depth.get(ivec2(x, y)), 0.5, "({x}, {y})");
                } else {
                    assert_eq!(target.depth.get(ivec2(x, y)), f32::MAX, "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_coverage_and_depth_scalar() {
        assert_fill_rule_coverage(&render::<Scalar>(&test_triangle(None)));
    }

    #[test]
    fn test_widths_agree_exactly() {
        let tri = test_triangle(None);
        let scalar = render::<Scalar>(&tri);
        let x4 = render::<X4>(&tri);
        let x8 = render::<X8>(&tri);

        assert_eq!(scalar.frame.pixels(), x4.frame.pixels());
        assert_eq!(scalar.frame.pixels(), x8.frame.pixels());
        assert_fill_rule_coverage(&x8);
    }

    #[test]
    fn test_flat_white_stays_white() {
        // Barycentric weights sum to one, so interpolating equal vertex
        // colors must reproduce them after rounding.
        let target = render::<X8>(&test_triangle(None));
        assert_eq!(target.frame.get_pixel(ivec2(2, 3)), Color::WHITE);
    }

    #[test]
    fn test_depth_test_keeps_nearer_pixel() {
        let mut target = RenderTarget::default();
        target.create(ivec2(8, 8));

        let near = test_triangle(None);
        let mut far = test_triangle(None);
        for v in &mut far.clip {
            v.z = 0.9;
        }
        far.colors = [Color::RED; 3];

        let mut view = target.tile_view();
        PixelProcessor::new(&mut view, &near, near.bounds).run::<X8>();
        PixelProcessor::new(&mut view, &far, far.bounds).run::<X8>();

        assert_eq!(target.frame.get_pixel(ivec2(1, 1)), Color::WHITE);
        assert_eq!(target.depth.get(ivec2(1, 1)), 0.5);
    }

    #[test]
    fn test_equal_depth_first_write_wins() {
        let mut target = RenderTarget::default();
        target.create(ivec2(8, 8));

        let first = test_triangle(None);
        let mut second = test_triangle(None);
        second.colors = [Color::BLUE; 3];

        let mut view = target.tile_view();
        PixelProcessor::new(&mut view, &first, first.bounds).run::<X8>();
        PixelProcessor::new(&mut view, &second, second.bounds).run::<X8>();

        assert_eq!(target.frame.get_pixel(ivec2(1, 1)), Color::WHITE);
    }

    #[test]
    fn test_depth_interpolation_stays_in_vertex_range() {
        // Barycentric weights lie in [0, 1] and sum to one, so interpolated
        // depth cannot leave the vertex range.
        let mut tri = test_triangle(None);
        tri.clip[0].z = 0.2;
        tri.clip[1].z = 0.4;
        tri.clip[2].z = 0.8;

        let target = render::<X8>(&tri);
        for y in 0..8 {
            for x in 0..8 {
                let z = target.depth.get(ivec2(x, y));
                if z != f32::MAX {
                    assert!((0.2..=0.8).contains(&z), "({x}, {y}): {z}");
                }
            }
        }

        // Near the right-angle corner the first vertex dominates.
        assert!((target.depth.get(ivec2(0, 0)) - 0.2).abs() < 0.1);
    }

    #[test]
    fn test_textured_sampling() {
        let image = Arc::new(Image::solid(ivec2(4, 4), Color::GREEN));
        let target = render::<X8>(&test_triangle(Some(image)));
        assert_eq!(target.frame.get_pixel(ivec2(1, 1)), Color::GREEN);
        assert_eq!(target.frame.get_pixel(ivec2(7, 7)), Color::from_word(0));
    }

    #[test]
    fn test_partial_tile_box() {
        // Restricting the box to a sub-rectangle must only touch it.
        let tri = test_triangle(None);
        let mut target = RenderTarget::default();
        target.create(ivec2(8, 8));

        let sub = BoundingBox {
            min: ivec2(0, 0),
            max: ivec2(4, 4),
        };
        let mut view = target.tile_view();
        PixelProcessor::new(&mut view, &tri, sub).run::<X4>();

        assert_eq!(target.frame.get_pixel(ivec2(1, 1)), Color::WHITE);
        assert_eq!(target.frame.get_pixel(ivec2(1, 5)), Color::from_word(0));
    }
}
