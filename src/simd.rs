//! Lane-width abstraction for the pixel kernel
//!
//! The rasterization kernel is written exactly once against the [`Lanes`]
//! trait: a small capability surface (splat / ramp / add / or /
//! compare-to-mask on integers, splat / add / mul / div / store on floats)
//! that is implemented per vector width. [`Scalar`] is the lane-width-1
//! instantiation and doubles as the cross-check oracle in tests; [`X4`] and
//! [`X8`] run the same arithmetic over 4 and 8 pixels per instruction via
//! the `wide` crate.
//!
//! Integer edge arithmetic is exact at every width. Float interpolation uses
//! the same IEEE operations in the same order at every width, so the widths
//! produce identical results for identical inputs.

use wide::{f32x4, f32x8, i32x4, i32x8, CmpGt};

/// The widest lane count any implementation uses. Scratch buffers in the
/// kernel and tile-width alignment in the partitioner are sized by this.
pub const MAX_LANES: usize = 8;

/// Capability interface for one vector width.
pub trait Lanes {
    /// Number of pixels processed per step.
    const WIDTH: usize;

    type I32: Copy;
    type F32: Copy;

    fn splat_i32(v: i32) -> Self::I32;

    /// `[0, step, 2*step, ..]` across the lanes.
    fn ramp_i32(step: i32) -> Self::I32;

    fn add_i32(a: Self::I32, b: Self::I32) -> Self::I32;
    fn or_i32(a: Self::I32, b: Self::I32) -> Self::I32;

    /// Bitmask with bit `i` set when lane `i` is `>= 0`.
    fn nonneg_mask(v: Self::I32) -> u32;

    fn to_f32(v: Self::I32) -> Self::F32;

    fn splat_f32(v: f32) -> Self::F32;
    fn add_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn mul_f32(a: Self::F32, b: Self::F32) -> Self::F32;
    fn div_f32(a: Self::F32, b: Self::F32) -> Self::F32;

    /// Write the lanes into `out[..WIDTH]`.
    fn store_f32(v: Self::F32, out: &mut [f32]);
}

/// One pixel per step; the reference path.
pub struct Scalar;

impl Lanes for Scalar {
    const WIDTH: usize = 1;

    type I32 = i32;
    type F32 = f32;

    #[inline]
    fn splat_i32(v: i32) -> i32 {
        v
    }

    #[inline]
    fn ramp_i32(_step: i32) -> i32 {
        0
    }

    #[inline]
    fn add_i32(a: i32, b: i32) -> i32 {
        a + b
    }

    #[inline]
    fn or_i32(a: i32, b: i32) -> i32 {
        a | b
    }

    #[inline]
    fn nonneg_mask(v: i32) -> u32 {
        (v >= 0) as u32
    }

    #[inline]
    fn to_f32(v: i32) -> f32 {
        v as f32
    }

    #[inline]
    fn splat_f32(v: f32) -> f32 {
        v
    }

    #[inline]
    fn add_f32(a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline]
    fn mul_f32(a: f32, b: f32) -> f32 {
        a * b
    }

    #[inline]
    fn div_f32(a: f32, b: f32) -> f32 {
        a / b
    }

    #[inline]
    fn store_f32(v: f32, out: &mut [f32]) {
        out[0] = v;
    }
}

/// Four pixels per step (128-bit lanes).
pub struct X4;

impl Lanes for X4 {
    const WIDTH: usize = 4;

    type I32 = i32x4;
    type F32 = f32x4;

    #[inline]
    fn splat_i32(v: i32) -> i32x4 {
        i32x4::splat(v)
    }

    #[inline]
    fn ramp_i32(step: i32) -> i32x4 {
        i32x4::from([0, step, step * 2, step * 3])
    }

    #[inline]
    fn add_i32(a: i32x4, b: i32x4) -> i32x4 {
        a + b
    }

    #[inline]
    fn or_i32(a: i32x4, b: i32x4) -> i32x4 {
        a | b
    }

    #[inline]
    fn nonneg_mask(v: i32x4) -> u32 {
        let lanes = v.cmp_gt(i32x4::splat(-1)).to_array();
        let mut mask = 0;
        for (i, lane) in lanes.iter().enumerate() {
            mask |= ((*lane != 0) as u32) << i;
        }
        mask
    }

    #[inline]
    fn to_f32(v: i32x4) -> f32x4 {
        v.round_float()
    }

    #[inline]
    fn splat_f32(v: f32) -> f32x4 {
        f32x4::splat(v)
    }

    #[inline]
    fn add_f32(a: f32x4, b: f32x4) -> f32x4 {
        a + b
    }

    #[inline]
    fn mul_f32(a: f32x4, b: f32x4) -> f32x4 {
        a * b
    }

    #[inline]
    fn div_f32(a: f32x4, b: f32x4) -> f32x4 {
        a / b
    }

    #[inline]
    fn store_f32(v: f32x4, out: &mut [f32]) {
        out[..4].copy_from_slice(&v.to_array());
    }
}

/// Eight pixels per step (256-bit lanes).
pub struct X8;

impl Lanes for X8 {
    const WIDTH: usize = 8;

    type I32 = i32x8;
    type F32 = f32x8;

    #[inline]
    fn splat_i32(v: i32) -> i32x8 {
        i32x8::splat(v)
    }

    #[inline]
    fn ramp_i32(step: i32) -> i32x8 {
        i32x8::from([
            0,
            step,
            step * 2,
            step * 3,
            step * 4,
            step * 5,
            step * 6,
            step * 7,
        ])
    }

    #[inline]
    fn add_i32(a: i32x8, b: i32x8) -> i32x8 {
        a + b
    }

    #[inline]
    fn or_i32(a: i32x8, b: i32x8) -> i32x8 {
        a | b
    }

    #[inline]
    fn nonneg_mask(v: i32x8) -> u32 {
        let lanes = v.cmp_gt(i32x8::splat(-1)).to_array();
        let mut mask = 0;
        for (i, lane) in lanes.iter().enumerate() {
            mask |= ((*lane != 0) as u32) << i;
        }
        mask
    }

    #[inline]
    fn to_f32(v: i32x8) -> f32x8 {
        v.round_float()
    }

    #[inline]
    fn splat_f32(v: f32) -> f32x8 {
        f32x8::splat(v)
    }

    #[inline]
    fn add_f32(a: f32x8, b: f32x8) -> f32x8 {
        a + b
    }

    #[inline]
    fn mul_f32(a: f32x8, b: f32x8) -> f32x8 {
        a * b
    }

    #[inline]
    fn div_f32(a: f32x8, b: f32x8) -> f32x8 {
        a / b
    }

    #[inline]
    fn store_f32(v: f32x8, out: &mut [f32]) {
        out[..8].copy_from_slice(&v.to_array());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane_values<L: Lanes>(start: i32, step: i32) -> Vec<f32> {
        let v = L::add_i32(L::splat_i32(start), L::ramp_i32(step));
        let mut out = [0.0f32; MAX_LANES];
        L::store_f32(L::to_f32(v), &mut out);
        out[..L::WIDTH].to_vec()
    }

    #[test]
    fn test_ramp_matches_scalar() {
        for &(start, step) in &[(0, 1), (-7, 3), (100, -12)] {
            let wide4 = lane_values::<X4>(start, step);
            let wide8 = lane_values::<X8>(start, step);
            for i in 0..8 {
                let expected = (start + step * i as i32) as f32;
                if i < 4 {
                    assert_eq!(wide4[i], expected);
                }
                assert_eq!(wide8[i], expected);
            }
            assert_eq!(lane_values::<Scalar>(start, step), vec![start as f32]);
        }
    }

    #[test]
    fn test_nonneg_mask() {
        assert_eq!(Scalar::nonneg_mask(0), 1);
        assert_eq!(Scalar::nonneg_mask(-1), 0);

        let v = i32x4::from([-1, 0, 5, -100]);
        assert_eq!(X4::nonneg_mask(v), 0b0110);

        let v = i32x8::from([1, 1, -2, 0, -1, 3, -4, 7]);
        assert_eq!(X8::nonneg_mask(v), 0b1010_1011);
    }

    #[test]
    fn test_float_ops_match_scalar() {
        // Same IEEE operations at every width must agree bitwise.
        let a = 17.0f32;
        let b = 3.0f32;
        let scalar = Scalar::div_f32(Scalar::mul_f32(a, b), 7.0);

        let mut out = [0.0f32; MAX_LANES];
        X8::store_f32(
            X8::div_f32(X8::mul_f32(X8::splat_f32(a), X8::splat_f32(b)), X8::splat_f32(7.0)),
            &mut out,
        );
        for lane in &out {
            assert_eq!(lane.to_bits(), scalar.to_bits());
        }
    }
}
