//! Screen partitioning into tiles
//!
//! The surface is cut into `count` rectangular bins of near-equal area,
//! organized as columns of stacked tiles. Column widths are truncated to a
//! multiple of the maximum lane width so vectorized rows never straddle a
//! tile boundary; the rightmost column and the bottom tile of each column
//! absorb the remainders, so the tiles exactly cover the surface without
//! overlap.
//!
//! Each bin owns a triangle queue. Geometry processing appends to queues
//! single-threaded; shading drains them with one worker per bin, which is
//! what makes the unsynchronized pixel writes sound.

use glam::IVec2;

use crate::color::Color;
use crate::error::fatal;
use crate::packet::RenderTriangle;
use crate::simd::MAX_LANES;

/// One screen tile. `pos` is the top-left pixel, `size` its extent.
#[derive(Debug, Clone, Copy)]
pub struct Bin {
    pub pos: IVec2,
    pub size: IVec2,
    /// Clear color, a per-bin gray ramp that makes tile boundaries visible
    /// wherever no geometry lands.
    pub fill: Color,
}

impl Bin {
    /// One past the bottom-right pixel.
    #[inline]
    pub fn max(&self) -> IVec2 {
        self.pos + self.size
    }
}

fn bin_fill(index: usize) -> Color {
    let step = ((index % 32) as u32 + 1) * 8;
    Color::gray(step.min(255) as u8)
}

#[derive(Default)]
pub struct Binner {
    bins: Vec<Bin>,
    queues: Vec<Vec<RenderTriangle>>,
}

impl Binner {
    /// Partition a surface of `size` pixels into `count` bins.
    pub fn split(&mut self, size: IVec2, count: i32) {
        if count <= 0 {
            fatal(&format!("Invalid bin count: {count}"));
        }
        if size.x <= 0 || size.y <= 0 {
            fatal(&format!("Invalid surface size: {}x{}", size.x, size.y));
        }

        self.bins.clear();

        let total_area = size.x * size.y;
        let bin_area = total_area as f32 / count as f32;
        let bin_length = (bin_area.sqrt() as i32).max(1);

        // Extreme aspect ratios can push the nominal column count past the
        // bin count or down to zero; clamp and let the remainder logic
        // distribute the rest.
        let column_count = (size.x / bin_length).clamp(1, count);
        let column_bin_count = count / column_count;
        let mut remaining_bins = count % column_count;

        let total_columns_height = bin_length * count;

        let mut bin_x = 0;

        for i in 0..column_count {
            let bin_count = if remaining_bins > 0 {
                remaining_bins -= 1;
                column_bin_count + 1
            } else {
                column_bin_count
            };

            let column_height = bin_length * bin_count;

            let mut column_width =
                (column_height as f32 / total_columns_height as f32 * size.x as f32) as i32;
            column_width -= column_width % MAX_LANES as i32;

            let bin_width = if i == column_count - 1 {
                size.x - bin_x
            } else {
                column_width
            };

            let mut bin_height = size.y / bin_count;

            for j in 0..bin_count {
                let bin_y = j * bin_height;

                if j == bin_count - 1 {
                    bin_height += size.y - (bin_y + bin_height);
                }

                self.bins.push(Bin {
                    pos: IVec2::new(bin_x, bin_y),
                    size: IVec2::new(bin_width, bin_height),
                    fill: bin_fill(self.bins.len()),
                });
            }

            bin_x += bin_width;
        }

        self.queues = vec![Vec::new(); self.bins.len()];
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn queue_mut(&mut self, index: usize) -> &mut Vec<RenderTriangle> {
        &mut self.queues[index]
    }

    /// Bins and their queues, split for simultaneous borrowing during
    /// dispatch.
    pub fn parts(&mut self) -> (&[Bin], &mut [Vec<RenderTriangle>]) {
        (&self.bins, &mut self.queues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::ivec2;

    /// Every pixel must belong to exactly one bin.
    fn assert_exact_cover(size: IVec2, count: i32) {
        let mut binner = Binner::default();
        binner.split(size, count);
        assert_eq!(binner.bins().len(), count as usize);

        let mut owners = vec![0u8; (size.x * size.y) as usize];
        for bin in binner.bins() {
            assert!(bin.size.x > 0 && bin.size.y > 0, "degenerate bin {bin:?}");
            for y in bin.pos.y..bin.max().y {
                for x in bin.pos.x..bin.max().x {
                    owners[(y * size.x + x) as usize] += 1;
                }
            }
        }
        assert!(
            owners.iter().all(|&n| n == 1),
            "{}x{} / {count}: coverage not exact",
            size.x,
            size.y
        );
    }

    #[test]
    fn test_exact_coverage() {
        assert_exact_cover(ivec2(64, 64), 4);
        assert_exact_cover(ivec2(640, 480), 8);
        assert_exact_cover(ivec2(100, 75), 7);
        assert_exact_cover(ivec2(320, 240), 1);
        assert_exact_cover(ivec2(33, 17), 3);
    }

    #[test]
    fn test_interior_columns_lane_aligned() {
        let mut binner = Binner::default();
        binner.split(ivec2(640, 480), 8);

        let right_edge = binner.bins().iter().map(|b| b.max().x).max().unwrap();
        for bin in binner.bins() {
            if bin.max().x != right_edge {
                assert_eq!(bin.size.x % MAX_LANES as i32, 0, "bin {bin:?}");
            }
        }
    }

    #[test]
    fn test_queue_per_bin() {
        let mut binner = Binner::default();
        binner.split(ivec2(64, 64), 4);
        let (bins, queues) = binner.parts();
        assert_eq!(bins.len(), queues.len());
        assert!(queues.iter().all(Vec::is_empty));
    }

    #[test]
    fn test_fill_ramp() {
        let mut binner = Binner::default();
        binner.split(ivec2(640, 480), 8);
        assert_eq!(binner.bins()[0].fill, Color::gray(8));
        assert_eq!(binner.bins()[1].fill, Color::gray(16));
    }

    #[test]
    #[should_panic]
    fn test_zero_count_is_fatal() {
        Binner::default().split(ivec2(64, 64), 0);
    }

    #[test]
    #[should_panic]
    fn test_empty_surface_is_fatal() {
        Binner::default().split(ivec2(0, 64), 4);
    }
}
