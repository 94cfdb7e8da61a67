//! Linear-light RGBA pixel type.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// RGBA pixel with 32-bit float components, straight (unpremultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black, the value of every zero-filled pixel.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[inline]
    pub fn from_array(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Linear interpolation of all four channels.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let it = 1.0 - t;
        Self {
            r: self.r * it + other.r * t,
            g: self.g * it + other.g * t,
            b: self.b * it + other.b * t,
            a: self.a * it + other.a * t,
        }
    }
}
