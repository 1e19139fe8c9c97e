//! Geometry processing and frame orchestration
//!
//! The rasterizer owns the render target and the tile partition. A frame is
//! two parallel phases around a single-threaded middle:
//!
//! 1. every tile clears its pixels, depth and queue, in parallel;
//! 2. each scene triangle is transformed, culled, set up and cloned into the
//!    queue of every tile it touches;
//! 3. every tile drains its queue through the pixel kernel, in parallel.
//!
//! Workers in phases 1 and 3 write the shared target without locks, each
//! through its own raw [`TileView`]. This is sound because tiles partition
//! the surface exactly and each worker only touches its own tile's pixels.

use glam::{IVec2, Mat4, Vec4};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use wide::i32x4;

use crate::binner::{Bin, Binner};
use crate::bounds::BoundingBox;
use crate::camera::Camera;
use crate::color::Color;
use crate::model::{Scene, Triangle, Vertex};
use crate::packet::RenderTriangle;
use crate::pixel::PixelProcessor;
use crate::simd::{Scalar, X4, X8};
use crate::surface::{RenderTarget, TileView};

/// Vector width the pixel kernel runs at. All widths produce identical
/// images; narrower ones exist for older hardware and for cross-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaneWidth {
    Scalar,
    X4,
    #[default]
    X8,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RasterSettings {
    pub lane_width: LaneWidth,
}

/// Largest screen coordinate magnitude the integer edge arithmetic can
/// carry: edge values reach `8 * GUARD_BAND^2`, which must stay below
/// `i32::MAX`. Triangles projecting past this band are culled whole.
const GUARD_BAND: i32 = 8192;

/// `(b - a) x (p - a)`, twice the signed area of the triangle `a b p`.
/// Positive when `p` lies clockwise of `a -> b` in y-down screen space.
#[inline]
fn edge_cross(a: IVec2, b: IVec2, p: IVec2) -> i32 {
    let ab = b - a;
    let ap = p - a;
    ab.x * ap.y - ab.y * ap.x
}

/// Fill-rule classification: top and left edges own their pixels, the
/// others give them up via a -1 bias.
#[inline]
fn is_top_left(start: IVec2, end: IVec2) -> bool {
    let edge = end - start;

    let is_top = edge.y == 0 && edge.x > 0;
    let is_left = edge.y < 0;

    is_top || is_left
}

/// One tile's slice of the shared frame, handed to a worker.
///
/// Each job owns a raw [`TileView`] into the target, so no worker ever
/// holds a reference to the shared buffers; the tile-disjointness invariant
/// keeps the pointer writes from overlapping.
struct BinJob {
    view: TileView,
    bin: *const Bin,
    queue: *mut Vec<RenderTriangle>,
}

unsafe impl Send for BinJob {}
unsafe impl Sync for BinJob {}

fn bin_jobs(target: &mut RenderTarget, bins: &[Bin], queues: &mut [Vec<RenderTriangle>]) -> Vec<BinJob> {
    bins.iter()
        .zip(queues.iter_mut())
        .map(|(bin, queue)| BinJob {
            view: target.tile_view(),
            bin,
            queue,
        })
        .collect()
}

fn clear_bin(view: &mut TileView, bin: &Bin) {
    let width = view.width();
    let max = bin.max();

    for y in bin.pos.y..max.y {
        let offset = (y * width + bin.pos.x) as usize;
        let len = bin.size.x as usize;

        view.fill_span(offset, len, bin.fill);
        view.clear_span(offset, len);
    }
}

fn shade(view: &mut TileView, tri: &RenderTriangle, lane_width: LaneWidth) {
    let mut kernel = PixelProcessor::new(view, tri, tri.bounds);

    match lane_width {
        LaneWidth::Scalar => kernel.run::<Scalar>(),
        LaneWidth::X4 => kernel.run::<X4>(),
        LaneWidth::X8 => kernel.run::<X8>(),
    }
}

pub struct Rasterizer {
    target: RenderTarget,
    binner: Binner,
    camera: Option<Camera>,
    settings: RasterSettings,

    projection: Mat4,
    screen_space: Mat4,
    view: Mat4,
}

impl Rasterizer {
    pub fn create(size: IVec2, bin_count: i32) -> Self {
        let mut target = RenderTarget::default();
        target.create(size);

        let mut binner = Binner::default();
        binner.split(size, bin_count);

        let half_width = size.x as f32 / 2.0;
        let half_height = size.y as f32 / 2.0;

        // NDC to pixels, flipping y so rows grow downward. w passes through
        // untouched for the later divide.
        let screen_space = Mat4::from_cols(
            Vec4::new(half_width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -half_height, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(half_width, half_height, 0.0, 1.0),
        );

        Self {
            target,
            binner,
            camera: None,
            settings: RasterSettings::default(),
            projection: Mat4::ZERO,
            screen_space,
            view: Mat4::IDENTITY,
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.view = camera.transform.matrix().inverse();
        self.camera = Some(camera);
        self.compute_projection();
    }

    pub fn settings(&self) -> RasterSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: RasterSettings) {
        self.settings = settings;
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn size(&self) -> IVec2 {
        self.target.size
    }

    pub fn resize_bins(&mut self, bin_count: i32) {
        self.binner.split(self.target.size, bin_count);
    }

    fn compute_projection(&mut self) {
        let Some(camera) = &self.camera else {
            return;
        };

        let size = self.target.size;
        let height_over_width = size.y as f32 / size.x as f32;

        let tan_half_fov = (camera.fov().to_radians() / 2.0).tan();
        let z_range = camera.z_near() - camera.z_far();

        self.projection = Mat4::from_cols(
            Vec4::new(1.0 / tan_half_fov * height_over_width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0 / tan_half_fov, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (-camera.z_near() - camera.z_far()) / z_range, 1.0),
            Vec4::new(0.0, 0.0, 2.0 * camera.z_far() * camera.z_near() / z_range, 0.0),
        );
    }

    /// Transform, cull and set up one triangle, then queue it on every tile
    /// its clipped box touches.
    fn process_triangle(&mut self, vertices: &[Vertex], triangle: &Triangle, model_matrix: Mat4) {
        let vp = self.projection * self.view * model_matrix;

        let mut clip = [Vec4::ZERO; 3];
        let mut colors = [Color::WHITE; 3];

        for (i, &index) in triangle.indices.iter().enumerate() {
            let vertex = &vertices[index as usize];
            clip[i] = vp * vertex.position.extend(1.0);
            colors[i] = vertex.color;
        }

        // At or behind the camera plane; near-plane clipping is not done, so
        // the whole triangle goes.
        if clip.iter().any(|c| c.w <= 0.0) {
            return;
        }

        let mut v = [IVec2::ZERO; 3];
        for i in 0..3 {
            let screen = self.screen_space * clip[i];
            v[i] = IVec2::new((screen.x / screen.w) as i32, (screen.y / screen.w) as i32);
        }

        // Coordinates past the guard band would overflow the edge
        // arithmetic. No `abs`: a saturated cast can yield `i32::MIN`.
        if v.iter().any(|p| {
            p.x < -GUARD_BAND || p.x > GUARD_BAND || p.y < -GUARD_BAND || p.y > GUARD_BAND
        }) {
            return;
        }

        // Degenerate or back-facing.
        let area = edge_cross(v[0], v[1], v[2]);
        if area <= 0 {
            return;
        }

        let full = BoundingBox::from_points(v[0], v[1], v[2]);
        if !full.overlaps(IVec2::ZERO, self.target.size) {
            return;
        }

        let bounds = full.intersection(IVec2::ZERO, self.target.size);
        if bounds.is_empty() {
            return;
        }

        let p0 = bounds.min;

        let packet = RenderTriangle {
            clip,
            colors,
            uvs: triangle.uvs,
            diffuse: triangle.diffuse.clone(),
            area,
            bias: [
                if is_top_left(v[1], v[2]) { 0 } else { -1 },
                if is_top_left(v[2], v[0]) { 0 } else { -1 },
                if is_top_left(v[0], v[1]) { 0 } else { -1 },
            ],
            w_origin: [
                edge_cross(v[1], v[2], p0),
                edge_cross(v[2], v[0], p0),
                edge_cross(v[0], v[1], p0),
            ],
            delta_w: [
                IVec2::new(v[1].y - v[2].y, v[2].x - v[1].x),
                IVec2::new(v[2].y - v[0].y, v[0].x - v[2].x),
                IVec2::new(v[0].y - v[1].y, v[1].x - v[0].x),
            ],
            bounds,
        };

        self.dispatch(packet);
    }

    /// Clone the packet into every overlapped tile queue, rebasing its box
    /// and edge seeds onto that tile. Seeds are corrected four tiles at a
    /// time; the edge function being affine makes the correction one
    /// multiply-add per edge.
    fn dispatch(&mut self, packet: RenderTriangle) {
        let size = self.target.size;
        let (bins, queues) = self.binner.parts();

        let mut boxes: Vec<(usize, BoundingBox)> = Vec::with_capacity(bins.len());

        for (i, bin) in bins.iter().enumerate() {
            let bin_min = bin.pos.max(IVec2::ZERO);
            let bin_max = bin.max().min(size);

            if !packet.bounds.overlaps(bin_min, bin_max) {
                continue;
            }

            let tile_box = packet.bounds.intersection(bin_min, bin_max);
            if tile_box.is_empty() {
                continue;
            }

            boxes.push((i, tile_box));
        }

        let mut queue_entry = |index: usize, tile_box: BoundingBox, w_origin: [i32; 3]| {
            let mut entry = packet.clone();
            entry.bounds = tile_box;
            entry.w_origin = w_origin;
            queues[index].push(entry);
        };

        let mut i = 0;

        while i + 4 <= boxes.len() {
            let group = &boxes[i..i + 4];

            let dx = i32x4::from([
                group[0].1.min.x - packet.bounds.min.x,
                group[1].1.min.x - packet.bounds.min.x,
                group[2].1.min.x - packet.bounds.min.x,
                group[3].1.min.x - packet.bounds.min.x,
            ]);
            let dy = i32x4::from([
                group[0].1.min.y - packet.bounds.min.y,
                group[1].1.min.y - packet.bounds.min.y,
                group[2].1.min.y - packet.bounds.min.y,
                group[3].1.min.y - packet.bounds.min.y,
            ]);

            let mut seeds = [[0i32; 4]; 3];
            for e in 0..3 {
                let w = i32x4::splat(packet.w_origin[e])
                    + i32x4::splat(packet.delta_w[e].x) * dx
                    + i32x4::splat(packet.delta_w[e].y) * dy;
                seeds[e] = w.to_array();
            }

            for (j, &(index, tile_box)) in group.iter().enumerate() {
                queue_entry(index, tile_box, [seeds[0][j], seeds[1][j], seeds[2][j]]);
            }

            i += 4;
        }

        for &(index, tile_box) in &boxes[i..] {
            queue_entry(index, tile_box, packet.edges_at(tile_box.min));
        }
    }

    /// Render one frame of `scene` into the target, parallelized over
    /// `pool`. Returns with the frame complete; both parallel phases are
    /// joined before moving on.
    pub fn render_scene(&mut self, scene: &Scene, pool: &rayon::ThreadPool) {
        {
            let (bins, queues) = self.binner.parts();
            let mut jobs = bin_jobs(&mut self.target, bins, queues);

            pool.install(|| {
                jobs.par_iter_mut().for_each(|job| {
                    clear_bin(&mut job.view, unsafe { &*job.bin });
                    unsafe { (*job.queue).clear() };
                });
            });
        }

        for instance in &scene.instances {
            let model_matrix = instance.transform.matrix();

            for triangle in &instance.model.triangles {
                self.process_triangle(&instance.model.vertices, triangle, model_matrix);
            }
        }

        let lane_width = self.settings.lane_width;

        {
            let (bins, queues) = self.binner.parts();
            let mut jobs = bin_jobs(&mut self.target, bins, queues);

            pool.install(|| {
                jobs.par_iter_mut().for_each(|job| {
                    let queue = unsafe { &*job.queue };
                    for tri in queue.iter() {
                        shade(&mut job.view, tri, lane_width);
                    }
                });
            });
        }
    }
}
