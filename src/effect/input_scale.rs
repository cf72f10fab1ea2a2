use crate::foundation::error::{BackdropError, BackdropResult};

/// Below this blur radius (in units) automatic input scaling keeps full resolution:
/// downscaling artifacts are most visible at small radii.
pub const AUTO_MIN_BLUR_RADIUS: f32 = 7.0;

/// Automatic scale when a progressive gradient or mask needs resolution for faint bands.
pub const AUTO_MASKED_SCALE: f32 = 0.5;

/// Automatic scale for a plain full blur.
pub const AUTO_DEFAULT_SCALE: f32 = 0.3334;

/// Downscale policy applied to captured content before it is blurred.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputScale {
    #[default]
    None,
    Fixed(f32),
    Auto,
}

impl InputScale {
    pub fn validate(self) -> BackdropResult<()> {
        match self {
            Self::Fixed(scale) if !scale.is_finite() || scale <= 0.0 || scale > 1.0 => Err(
                BackdropError::validation("InputScale::Fixed must be finite and in (0, 1]"),
            ),
            _ => Ok(()),
        }
    }
}

/// Scale factor for the captured content layer.
pub fn scale_for(policy: InputScale, blur_radius: f32, has_progressive: bool, has_mask: bool) -> f32 {
    match policy {
        InputScale::None => 1.0,
        InputScale::Fixed(scale) => scale,
        InputScale::Auto => {
            if blur_radius < AUTO_MIN_BLUR_RADIUS {
                1.0
            } else if has_progressive || has_mask {
                AUTO_MASKED_SCALE
            } else {
                AUTO_DEFAULT_SCALE
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/input_scale.rs"]
mod tests;
