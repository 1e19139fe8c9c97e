//! Viewport: the public rendering surface
//!
//! Owns the worker pool and the rasterizer behind it. One viewport renders
//! one scene at a time into an RGBA pixel buffer the caller can blit or
//! encode; the tile count is matched to the worker count so every thread
//! owns whole tiles.

use glam::IVec2;

use crate::camera::Camera;
use crate::error::fatal;
use crate::model::Scene;
use crate::raster::{RasterSettings, Rasterizer};
use crate::simd::MAX_LANES;

pub struct Viewport {
    pool: rayon::ThreadPool,
    rasterizer: Rasterizer,
}

impl Viewport {
    /// Create a viewport of `size` pixels rendering on `threads` workers.
    pub fn create(size: IVec2, threads: usize) -> Self {
        if threads == 0 {
            fatal("Invalid viewport thread count");
        }

        if size.x <= 0 || size.y <= 0 {
            fatal(&format!("Invalid viewport resolution {}x{}", size.x, size.y));
        }

        log::info!("Creating viewport of resolution {}x{}", size.x, size.y);

        if size.x % MAX_LANES as i32 != 0 {
            log::warn!(
                "Viewport width ({} px) not aligned to vector width ({} px)",
                size.x,
                MAX_LANES
            );
        }

        let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool,
            Err(err) => fatal(&format!("Failed to build render pool: {err}")),
        };

        Self {
            pool,
            rasterizer: Rasterizer::create(size, threads as i32),
        }
    }

    pub fn set_camera(&mut self, camera: &Camera) {
        self.rasterizer.set_camera(camera.clone());
    }

    pub fn settings(&self) -> RasterSettings {
        self.rasterizer.settings()
    }

    pub fn set_settings(&mut self, settings: RasterSettings) {
        self.rasterizer.set_settings(settings);
    }

    /// Render one frame. Returns after the frame is complete.
    pub fn render(&mut self, scene: &Scene) {
        self.rasterizer.render_scene(scene, &self.pool);
    }

    /// The last rendered frame as RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.rasterizer.target().frame.pixels()
    }

    pub fn size(&self) -> IVec2 {
        self.rasterizer.size()
    }
}
