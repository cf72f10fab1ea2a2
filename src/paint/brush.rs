use smallvec::SmallVec;

use crate::foundation::core::{Color, Point};

/// Gradient color stop. `offset` is the position along the gradient in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

/// Inline storage fits the 4-stop band masks without allocating.
pub type ColorStops = SmallVec<[ColorStop; 4]>;

/// Paint source for fills, tints and masks.
///
/// When a brush is used as a mask only its alpha channel is read.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Brush {
    Solid {
        color: Color,
    },
    Linear {
        start: Point,
        end: Point,
        stops: ColorStops,
    },
    Radial {
        center: Point,
        radius: f64,
        stops: ColorStops,
    },
}

impl Brush {
    pub fn solid(color: Color) -> Self {
        Self::Solid { color }
    }

    pub fn linear(start: Point, end: Point, stops: impl IntoIterator<Item = (f32, Color)>) -> Self {
        Self::Linear {
            start,
            end,
            stops: collect_stops(stops),
        }
    }

    pub fn radial(
        center: Point,
        radius: f64,
        stops: impl IntoIterator<Item = (f32, Color)>,
    ) -> Self {
        Self::Radial {
            center,
            radius,
            stops: collect_stops(stops),
        }
    }

    /// Color of the brush at `p`, in the brush's own coordinate space.
    pub fn color_at(&self, p: Point) -> Color {
        match self {
            Self::Solid { color } => *color,
            Self::Linear { start, end, stops } => {
                let axis = *end - *start;
                let len2 = axis.hypot2();
                let t = if len2 <= f64::EPSILON {
                    1.0
                } else {
                    (p - *start).dot(axis) / len2
                };
                sample_stops(stops, t as f32)
            }
            Self::Radial {
                center,
                radius,
                stops,
            } => {
                let t = if *radius <= f64::EPSILON {
                    1.0
                } else {
                    (p - *center).hypot() / radius
                };
                sample_stops(stops, t as f32)
            }
        }
    }

    pub fn alpha_at(&self, p: Point) -> f32 {
        self.color_at(p).a.clamp(0.0, 1.0)
    }

    /// Returns the solid color when the brush is uniform.
    pub fn as_solid(&self) -> Option<Color> {
        match self {
            Self::Solid { color } => Some(*color),
            _ => None,
        }
    }
}

fn collect_stops(stops: impl IntoIterator<Item = (f32, Color)>) -> ColorStops {
    stops
        .into_iter()
        .map(|(offset, color)| ColorStop { offset, color })
        .collect()
}

/// Pads before the first stop and after the last one; stops are expected in ascending order.
fn sample_stops(stops: &[ColorStop], t: f32) -> Color {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Color::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.offset && t <= b.offset {
            let span = b.offset - a.offset;
            if span <= f32::EPSILON {
                return b.color;
            }
            return Color::lerp(a.color, b.color, (t - a.offset) / span);
        }
    }
    last.color
}

#[cfg(test)]
#[path = "../../tests/unit/paint/brush.rs"]
mod tests;
