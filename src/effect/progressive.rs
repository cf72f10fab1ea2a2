//! Progressive (spatially varying) blur specs and the band sequence that approximates them.
//!
//! A continuous intensity gradient is drawn as `N` soft-edged bands. Each band is the blurred
//! content at one intensity, masked by a 4-stop gradient so neighbouring bands overlap without
//! seams. Bands are always produced from the lowest to the highest intensity.

use crate::{
    effect::easing::Easing,
    foundation::core::{Color, Point, Size, resolve_point},
    foundation::error::{BackdropError, BackdropResult},
    foundation::math::lerp_f32,
    paint::brush::Brush,
};

/// Default band thickness, in density-independent units.
pub const DEFAULT_BAND_STEP: f64 = 64.0;

/// Fewest bands a gradient is split into; one band cannot express a transition.
pub const MIN_BANDS: u32 = 2;

/// Most bands a gradient is split into, however small the step.
pub const MAX_BANDS: u32 = 256;

/// Intensity varying along the axis from `start` to `end`.
///
/// Coordinates are consumer-local; infinite components resolve to the consumer's bounds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub start_intensity: f32,
    #[serde(default = "full_intensity")]
    pub end_intensity: f32,
    #[serde(default)]
    pub easing: Easing,
    /// Trade accuracy for a single masked draw where per-band drawing is expensive.
    #[serde(default)]
    pub prefer_performance: bool,
}

impl LinearGradient {
    /// Top-to-bottom gradient spanning `start_y..end_y` (use `f64::INFINITY` for "bottom").
    pub fn vertical(
        easing: Easing,
        start_y: f64,
        start_intensity: f32,
        end_y: f64,
        end_intensity: f32,
    ) -> Self {
        Self {
            start: Point::new(0.0, start_y),
            end: Point::new(0.0, end_y),
            start_intensity,
            end_intensity,
            easing,
            prefer_performance: false,
        }
    }

    /// Left-to-right gradient spanning `start_x..end_x` (use `f64::INFINITY` for "right").
    pub fn horizontal(
        easing: Easing,
        start_x: f64,
        start_intensity: f32,
        end_x: f64,
        end_intensity: f32,
    ) -> Self {
        Self {
            start: Point::new(start_x, 0.0),
            end: Point::new(end_x, 0.0),
            start_intensity,
            end_intensity,
            easing,
            prefer_performance: false,
        }
    }

    /// Single gradient mask running from start to end intensity, used instead of bands when
    /// `prefer_performance` is set.
    pub fn approximation_mask(&self, size: Size) -> Brush {
        let start = resolve_point(self.start, size);
        let end = resolve_point(self.end, size);
        let stops = (0..=4).map(|i| {
            let t = i as f32 / 4.0;
            let a = lerp_f32(
                self.start_intensity,
                self.end_intensity,
                self.easing.apply(t),
            );
            (t, Color::BLACK.with_alpha(a))
        });
        Brush::linear(start, end, stops)
    }
}

/// Intensity varying with distance from `center`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RadialGradient {
    pub center: Point,
    pub radius: f64,
    #[serde(default = "full_intensity")]
    pub center_intensity: f32,
    #[serde(default)]
    pub edge_intensity: f32,
    #[serde(default)]
    pub easing: Easing,
}

impl RadialGradient {
    pub fn approximation_mask(&self, size: Size) -> Brush {
        let center = resolve_point(self.center, size);
        let stops = (0..=4).map(|i| {
            let t = i as f32 / 4.0;
            let a = lerp_f32(
                self.center_intensity,
                self.edge_intensity,
                self.easing.apply(t),
            );
            (t, Color::BLACK.with_alpha(a))
        });
        Brush::radial(center, self.radius, stops)
    }
}

fn full_intensity() -> f32 {
    1.0
}

/// Progressive blur gradient.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progressive {
    Linear(LinearGradient),
    Radial(RadialGradient),
    /// Per-pixel intensity taken from the brush's alpha channel; RGB is ignored.
    Brush(Brush),
}

impl Progressive {
    pub fn validate(&self) -> BackdropResult<()> {
        fn intensity(name: &str, v: f32) -> BackdropResult<()> {
            if !(0.0..=1.0).contains(&v) {
                return Err(BackdropError::validation(format!(
                    "{name} must be in [0, 1], got {v}"
                )));
            }
            Ok(())
        }
        match self {
            Self::Linear(g) => {
                intensity("start_intensity", g.start_intensity)?;
                intensity("end_intensity", g.end_intensity)
            }
            Self::Radial(g) => {
                if !g.radius.is_finite() || g.radius < 0.0 {
                    return Err(BackdropError::validation(
                        "radial gradient radius must be finite and >= 0",
                    ));
                }
                intensity("center_intensity", g.center_intensity)?;
                intensity("edge_intensity", g.edge_intensity)
            }
            Self::Brush(_) => Ok(()),
        }
    }

    /// A single mask approximating the whole gradient.
    pub fn approximation_mask(&self, size: Size) -> Brush {
        match self {
            Self::Linear(g) => g.approximation_mask(size),
            Self::Radial(g) => g.approximation_mask(size),
            Self::Brush(b) => b.clone(),
        }
    }

    /// Whether the strategy may replace per-band drawing with one masked draw.
    pub fn prefers_performance(&self) -> bool {
        matches!(self, Self::Linear(g) if g.prefer_performance)
    }
}

/// One step of a progressive blur: draw the content at `intensity`, masked by `mask`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Band {
    pub mask: Brush,
    pub intensity: f32,
}

#[derive(Clone, Debug, PartialEq)]
enum BandAxis {
    Linear { start: Point, end: Point },
    Radial { center: Point, radius: f64 },
}

#[derive(Clone, Debug, PartialEq)]
enum BandShape {
    Stepped {
        axis: BandAxis,
        from: f32,
        to: f32,
        easing: Easing,
        steps: u32,
    },
    Single(Brush),
}

/// Finite band sequence. It is a pure function of its gradient: clone it before iterating, or
/// call [`generate_bands`] again, to replay the same bands.
#[derive(Clone, Debug, PartialEq)]
pub struct Bands {
    shape: BandShape,
    cursor: u32,
}

impl Bands {
    /// Total number of bands, independent of iteration progress.
    pub fn band_count(&self) -> u32 {
        match &self.shape {
            BandShape::Stepped { steps, .. } => *steps,
            BandShape::Single(_) => 1,
        }
    }

    fn band_at(&self, k: u32) -> Band {
        match &self.shape {
            BandShape::Single(brush) => Band {
                mask: brush.clone(),
                intensity: 1.0,
            },
            BandShape::Stepped {
                axis,
                from,
                to,
                easing,
                steps,
            } => {
                let n = *steps;
                // Ascend when intensity grows along the axis, otherwise walk it backwards so
                // bands are always emitted from low to high intensity.
                let i = if to >= from { k + 1 } else { n - k };
                let nf = n as f32;
                let fraction = i as f32 / nf;
                let intensity = lerp_f32(*from, *to, easing.apply(fraction));

                let lo = from.min(*to);
                let hi = from.max(*to);
                let stop = |j: i64| (j as f32 / nf).clamp(lo, hi);
                let i = i64::from(i);
                let stops = [
                    (stop(i - 2), Color::TRANSPARENT),
                    (stop(i - 1), Color::BLACK),
                    (stop(i), Color::BLACK),
                    (stop(i + 1), Color::TRANSPARENT),
                ];
                let mask = match axis {
                    BandAxis::Linear { start, end } => Brush::linear(*start, *end, stops),
                    BandAxis::Radial { center, radius } => Brush::radial(*center, *radius, stops),
                };
                Band { mask, intensity }
            }
        }
    }
}

impl Iterator for Bands {
    type Item = Band;

    fn next(&mut self) -> Option<Band> {
        if self.cursor >= self.band_count() {
            return None;
        }
        let band = self.band_at(self.cursor);
        self.cursor += 1;
        Some(band)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.band_count().saturating_sub(self.cursor) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Bands {}

fn step_count(length: f64, step: f64) -> u32 {
    if !length.is_finite() || !step.is_finite() || step <= 0.0 {
        return MIN_BANDS;
    }
    // At most one band per pixel of gradient length.
    let n = (length / step.max(1.0)).ceil();
    (n.min(f64::from(MAX_BANDS)) as u32).max(MIN_BANDS)
}

/// Band sequence for a linear gradient over a consumer of `size`, `step` units per band.
pub fn linear_bands(spec: &LinearGradient, size: Size, step: f64) -> Bands {
    let start = resolve_point(spec.start, size);
    let end = resolve_point(spec.end, size);
    Bands {
        shape: BandShape::Stepped {
            axis: BandAxis::Linear { start, end },
            from: spec.start_intensity,
            to: spec.end_intensity,
            easing: spec.easing,
            steps: step_count((end - start).hypot(), step),
        },
        cursor: 0,
    }
}

/// Band sequence for a radial gradient, stepping along the radius.
pub fn radial_bands(spec: &RadialGradient, size: Size, step: f64) -> Bands {
    let center = resolve_point(spec.center, size);
    Bands {
        shape: BandShape::Stepped {
            axis: BandAxis::Radial {
                center,
                radius: spec.radius,
            },
            from: spec.center_intensity,
            to: spec.edge_intensity,
            easing: spec.easing,
            steps: step_count(spec.radius, step),
        },
        cursor: 0,
    }
}

/// Band sequence for any progressive gradient. Brush gradients yield one band masked by the brush.
pub fn generate_bands(spec: &Progressive, size: Size, step: f64) -> Bands {
    match spec {
        Progressive::Linear(g) => linear_bands(g, size, step),
        Progressive::Radial(g) => radial_bands(g, size, step),
        Progressive::Brush(b) => Bands {
            shape: BandShape::Single(b.clone()),
            cursor: 0,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/progressive.rs"]
mod tests;
