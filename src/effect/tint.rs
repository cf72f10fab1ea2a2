use crate::{
    foundation::core::{Color, Rect, Size, Vec2},
    paint::brush::Brush,
    paint::display_list::{BlendMode, DisplayList},
};

/// Blur radius (in units) at which the scrim alpha boost doubles a tint's alpha.
pub const SCRIM_BOOST_RADIUS: f32 = 72.0;

/// A flat overlay drawn on top of (or instead of) the blurred content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tint {
    Color {
        color: Color,
        #[serde(default)]
        blend: BlendMode,
    },
    Brush {
        brush: Brush,
        #[serde(default)]
        blend: BlendMode,
    },
}

impl Tint {
    pub fn color(color: Color) -> Self {
        Self::Color {
            color,
            blend: BlendMode::SrcOver,
        }
    }

    pub fn brush(brush: Brush) -> Self {
        Self::Brush {
            brush,
            blend: BlendMode::SrcOver,
        }
    }

    pub fn with_blend(self, blend: BlendMode) -> Self {
        match self {
            Self::Color { color, .. } => Self::Color { color, blend },
            Self::Brush { brush, .. } => Self::Brush { brush, blend },
        }
    }

    pub fn blend(&self) -> BlendMode {
        match self {
            Self::Color { blend, .. } | Self::Brush { blend, .. } => *blend,
        }
    }

    /// Whether drawing the tint can change anything.
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Color { color, .. } => color.is_visible(),
            Self::Brush { .. } => true,
        }
    }

    /// Same tint with its color alpha multiplied by `factor` (clamped to 1).
    /// Brush tints have no single alpha to scale and are returned unchanged.
    pub fn scale_alpha(&self, factor: f32) -> Self {
        match self {
            Self::Color { color, blend } => Self::Color {
                color: color.with_alpha(color.a * factor),
                blend: *blend,
            },
            Self::Brush { .. } => self.clone(),
        }
    }
}

/// Scrim alpha compensating for a missing blur: `min(1, alpha * (1 + radius / 72))`.
pub fn boosted_alpha(alpha: f32, blur_radius: f32) -> f32 {
    (alpha * (1.0 + blur_radius.max(0.0) / SCRIM_BOOST_RADIUS)).min(1.0)
}

/// Tint drawn by the scrim fallback: the explicit fallback tint if set, else the first tint
/// with its alpha boosted.
pub fn scrim_tint(fallback: Option<&Tint>, tints: &[Tint], blur_radius: f32) -> Option<Tint> {
    if let Some(fallback) = fallback.filter(|t| t.is_visible()) {
        return Some(fallback.clone());
    }
    let first = tints.first()?;
    Some(match first {
        Tint::Color { color, blend } => Tint::Color {
            color: color.with_alpha(boosted_alpha(color.a, blur_radius)),
            blend: *blend,
        },
        Tint::Brush { .. } => first.clone(),
    })
}

/// Draw `tint` over the rectangle at `offset` with `size`, optionally masked.
pub fn draw_overlay(
    list: &mut DisplayList,
    tint: &Tint,
    size: Size,
    offset: Vec2,
    mask: Option<&Brush>,
) {
    if !tint.is_visible() || size.width <= 0.0 || size.height <= 0.0 {
        return;
    }
    let rect = Rect::from_origin_size(offset.to_point(), size);
    match (tint, mask) {
        (Tint::Color { color, blend }, Some(mask)) => {
            // Color filters cannot be combined with a separate mask in one pass.
            list.with_group(*blend, |group| {
                group.fill_rect(rect, Brush::solid(*color), BlendMode::Src);
                group.fill_rect(rect, mask.clone(), BlendMode::DstIn);
            });
        }
        (Tint::Color { color, blend }, None) => {
            list.fill_rect(rect, Brush::solid(*color), *blend);
        }
        (Tint::Brush { brush, blend }, mask) => {
            list.fill_rect(rect, brush.clone(), *blend);
            if let Some(mask) = mask {
                list.fill_rect(rect, mask.clone(), BlendMode::DstIn);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/tint.rs"]
mod tests;
