//! Packed RGBA color
//!
//! The framebuffer moves pixels as raw 32-bit words, so the byte layout of
//! `Color` is significant: `r`, `g`, `b`, `a` in memory order, one byte each.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 4-channel, 8-bit-per-channel color, packed into 4 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);

    /// Opaque color from 8-bit RGB.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray of the given intensity.
    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }

    /// The packed 32-bit word this color occupies in the framebuffer.
    #[inline]
    pub fn to_word(self) -> u32 {
        bytemuck::cast(self)
    }

    #[inline]
    pub fn from_word(word: u32) -> Self {
        bytemuck::cast(word)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
