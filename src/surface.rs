//! Pixel storage: color and depth buffers
//!
//! Two flat, parallel arrays addressed by linear pixel offset `y * W + x`.
//! The color buffer stores one packed 32-bit word per pixel; the depth
//! buffer one `f32` per pixel, reset to `f32::MAX` on clear.
//!
//! During the parallel phases each worker writes through a [`TileView`], a
//! raw window onto both arrays. Views never hold references to the buffers,
//! so concurrent workers never materialize aliased `&mut`; the tile
//! invariant (concurrently live views cover disjoint pixels) keeps their
//! writes from overlapping.

use glam::IVec2;

use crate::color::Color;
use crate::simd::MAX_LANES;

/// Fill a span with `value`, `MAX_LANES` elements per store plus a scalar
/// remainder.
fn fill_lanes<T: Copy>(span: &mut [T], value: T) {
    let lanes = [value; MAX_LANES];

    let mut chunks = span.chunks_exact_mut(MAX_LANES);
    for chunk in &mut chunks {
        chunk.copy_from_slice(&lanes);
    }
    for item in chunks.into_remainder() {
        *item = value;
    }
}

/// RGBA color buffer, 4 bytes per pixel.
#[derive(Default)]
pub struct FrameBuffer {
    size: IVec2,
    pixels: Vec<u32>,
}

impl FrameBuffer {
    /// Allocate (or reallocate) for the given size. Prior contents are
    /// undefined until the next clear.
    pub fn create(&mut self, size: IVec2) {
        self.size = size;
        self.pixels.resize((size.x * size.y) as usize, 0);
    }

    #[inline]
    pub fn set_pixel(&mut self, pos: IVec2, color: Color) {
        self.pixels[(pos.y * self.size.x + pos.x) as usize] = color.to_word();
    }

    #[inline]
    pub fn get_pixel(&self, pos: IVec2) -> Color {
        Color::from_word(self.pixels[(pos.y * self.size.x + pos.x) as usize])
    }

    /// The full color buffer as presentable RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Depth buffer, one `f32` per pixel. Smaller values are nearer.
#[derive(Default)]
pub struct DepthBuffer {
    size: IVec2,
    data: Vec<f32>,
}

impl DepthBuffer {
    pub fn create(&mut self, size: IVec2) {
        self.size = size;
        self.data.resize((size.x * size.y) as usize, f32::MAX);
    }

    #[inline]
    pub fn get(&self, pos: IVec2) -> f32 {
        self.data[(pos.y * self.size.x + pos.x) as usize]
    }

    #[inline]
    pub fn set(&mut self, pos: IVec2, value: f32) {
        self.data[(pos.y * self.size.x + pos.x) as usize] = value;
    }
}

/// The color and depth surfaces a frame is rendered into.
#[derive(Default)]
pub struct RenderTarget {
    pub size: IVec2,
    pub frame: FrameBuffer,
    pub depth: DepthBuffer,
}

impl RenderTarget {
    pub fn create(&mut self, size: IVec2) {
        self.size = size;
        self.frame.create(size);
        self.depth.create(size);
    }

    /// A raw view one worker writes its tile through.
    ///
    /// The view must not outlive the target, and views used concurrently
    /// must cover disjoint pixels.
    pub fn tile_view(&mut self) -> TileView {
        TileView {
            pixels: self.frame.pixels.as_mut_ptr(),
            depth: self.depth.data.as_mut_ptr(),
            len: self.frame.pixels.len(),
            width: self.size.x,
        }
    }
}

/// One worker's window onto the target; pointer-based so parallel workers
/// never hold aliased `&mut` to the shared buffers.
pub struct TileView {
    pixels: *mut u32,
    depth: *mut f32,
    len: usize,
    width: i32,
}

unsafe impl Send for TileView {}

impl TileView {
    /// Surface width in pixels, the row stride of both arrays.
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    fn index(&self, pos: IVec2) -> usize {
        let index = (pos.y * self.width + pos.x) as usize;
        debug_assert!(index < self.len);
        index
    }

    #[inline]
    pub fn set_pixel(&mut self, pos: IVec2, color: Color) {
        let index = self.index(pos);
        unsafe { *self.pixels.add(index) = color.to_word() }
    }

    #[inline]
    pub fn depth_at(&self, pos: IVec2) -> f32 {
        let index = self.index(pos);
        unsafe { *self.depth.add(index) }
    }

    #[inline]
    pub fn set_depth(&mut self, pos: IVec2, value: f32) {
        let index = self.index(pos);
        unsafe { *self.depth.add(index) = value }
    }

    /// Fill `len` pixels starting at linear offset `offset`.
    pub fn fill_span(&mut self, offset: usize, len: usize, color: Color) {
        debug_assert!(offset + len <= self.len);
        let span = unsafe { std::slice::from_raw_parts_mut(self.pixels.add(offset), len) };
        fill_lanes(span, color.to_word());
    }

    /// Reset `len` depth values starting at linear offset `offset`.
    pub fn clear_span(&mut self, offset: usize, len: usize) {
        debug_assert!(offset + len <= self.len);
        let span = unsafe { std::slice::from_raw_parts_mut(self.depth.add(offset), len) };
        fill_lanes(span, f32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::ivec2;

    #[test]
    fn test_set_get_pixel() {
        let mut fb = FrameBuffer::default();
        fb.create(ivec2(8, 4));
        fb.set_pixel(ivec2(3, 2), Color::RED);
        assert_eq!(fb.get_pixel(ivec2(3, 2)), Color::RED);
        assert_eq!(fb.get_pixel(ivec2(2, 3)), Color::from_word(0));
    }

    #[test]
    fn test_pixel_bytes_layout() {
        let mut fb = FrameBuffer::default();
        fb.create(ivec2(2, 1));
        fb.set_pixel(ivec2(0, 0), Color::rgba(1, 2, 3, 4));
        assert_eq!(&fb.pixels()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_view_writes_land_in_target() {
        let mut target = RenderTarget::default();
        target.create(ivec2(8, 4));

        let mut view = target.tile_view();
        view.set_pixel(ivec2(3, 2), Color::RED);
        view.set_depth(ivec2(3, 2), 0.25);

        assert_eq!(target.frame.get_pixel(ivec2(3, 2)), Color::RED);
        assert_eq!(target.depth.get(ivec2(3, 2)), 0.25);
    }

    #[test]
    fn test_fill_span_with_remainder() {
        // 11 pixels: one 8-wide store plus a 3-pixel scalar tail.
        let mut target = RenderTarget::default();
        target.create(ivec2(16, 1));
        target.tile_view().fill_span(2, 11, Color::GREEN);

        for x in 0..16 {
            let expected = if (2..13).contains(&x) {
                Color::GREEN
            } else {
                Color::from_word(0)
            };
            assert_eq!(target.frame.get_pixel(ivec2(x, 0)), expected, "x = {x}");
        }
    }

    #[test]
    fn test_depth_clear_span() {
        let mut target = RenderTarget::default();
        target.create(ivec2(16, 1));
        for x in 0..16 {
            target.depth.set(ivec2(x, 0), 0.5);
        }
        target.tile_view().clear_span(4, 9);
        for x in 0..16 {
            let expected = if (4..13).contains(&x) { f32::MAX } else { 0.5 };
            assert_eq!(target.depth.get(ivec2(x, 0)), expected, "x = {x}");
        }
    }

    #[test]
    fn test_recreate_resizes() {
        let mut target = RenderTarget::default();
        target.create(ivec2(4, 4));
        target.create(ivec2(8, 8));
        assert_eq!(target.frame.pixels().len(), 8 * 8 * 4);
        assert_eq!(target.size, ivec2(8, 8));
    }
}
