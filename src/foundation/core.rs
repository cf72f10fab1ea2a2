pub use kurbo::{Affine, Point, Rect, RoundedRect, Size, Vec2};

use crate::foundation::math::{lerp_f32, unit_to_u8};

/// Identifier of the window (or other invalidation scope) that owns a region.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct WindowId(pub u64);

/// Integer pixel size of an offscreen layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct IntSize {
    pub width: u32,
    pub height: u32,
}

impl IntSize {
    pub const ZERO: Self = Self {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Smallest integer size covering `size`. Non-finite or non-positive dimensions map to 0.
    pub fn ceil_from(size: Size) -> Self {
        fn dim(v: f64) -> u32 {
            if !v.is_finite() || v <= 0.0 {
                0
            } else {
                v.ceil().min(f64::from(u32::MAX)) as u32
            }
        }
        Self::new(dim(size.width), dim(size.height))
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Straight (non-premultiplied) RGBA color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Whether drawing this color can change a destination pixel.
    pub fn is_visible(self) -> bool {
        self.a > 0.0
    }

    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::rgba(
            lerp_f32(a.r, b.r, t),
            lerp_f32(a.g, b.g, t),
            lerp_f32(a.b, b.b, t),
            lerp_f32(a.a, b.a, t),
        )
    }

    /// Premultiplied RGBA8 representation.
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        let a = self.a.clamp(0.0, 1.0);
        [
            unit_to_u8(self.r.clamp(0.0, 1.0) * a),
            unit_to_u8(self.g.clamp(0.0, 1.0) * a),
            unit_to_u8(self.b.clamp(0.0, 1.0) * a),
            unit_to_u8(a),
        ]
    }
}

/// Resolve a point whose components may be infinite against a concrete size.
///
/// `+inf` maps to the size's extent and `-inf` to zero, so "until the end" style gradient
/// points follow the consumer's bounds.
pub fn resolve_point(p: Point, size: Size) -> Point {
    fn axis(v: f64, extent: f64) -> f64 {
        if v == f64::INFINITY {
            extent
        } else if v == f64::NEG_INFINITY {
            0.0
        } else {
            v
        }
    }
    Point::new(axis(p.x, size.width), axis(p.y, size.height))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
