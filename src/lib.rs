//! Tile-parallel software rasterizer
//!
//! A CPU triangle rasterizer built around three ideas: the screen is split
//! into near-equal tiles that each worker thread owns outright, coverage is
//! decided by incremental integer edge functions with a top-left fill rule,
//! and the pixel kernel is written once against a lane-width trait so the
//! same code runs scalar, 4-wide or 8-wide with identical output.
//!
//! # Module organization
//!
//! - `color` - packed RGBA color
//! - `simd` - the `Lanes` trait and its scalar/4/8-wide implementations
//! - `bounds` - integer screen-space bounding boxes
//! - `surface` - frame and depth buffers, the render target
//! - `binner` - tile partitioning and per-tile triangle queues
//! - `transform` / `camera` - poses and the perspective camera
//! - `model` - vertices, triangles, meshes, scenes, images
//! - `registry` - shared model/image storage
//! - `packet` / `pixel` - the per-triangle packet and the pixel kernel
//! - `raster` - geometry processing, dispatch and the frame loop
//! - `viewport` - the public surface: pool + rasterizer + pixel readback

pub mod binner;
pub mod bounds;
pub mod camera;
pub mod color;
pub mod error;
pub mod model;
pub mod packet;
pub mod pixel;
pub mod raster;
pub mod registry;
pub mod simd;
pub mod surface;
pub mod transform;
pub mod viewport;

pub use camera::Camera;
pub use color::Color;
pub use model::{Image, Model, ModelInstance, Scene, Triangle, Vertex};
pub use raster::{LaneWidth, RasterSettings, Rasterizer};
pub use registry::ResourceRegistry;
pub use transform::Transform;
pub use viewport::Viewport;
