//! Layered effect configuration.
//!
//! A [`Style`] is a partial configuration. Consumers resolve three of them, highest priority
//! first: the per-instance style, the per-call-site style and the ambient style, then fall
//! back to defaults. The result is written field by field into a [`ResolvedStyle`], which
//! records every change in its own dirty tracker.

use crate::{
    effect::dirty::{DirtyFields, DirtyTracker},
    effect::input_scale::InputScale,
    effect::progressive::Progressive,
    effect::tint::Tint,
    foundation::core::Color,
    foundation::error::{BackdropError, BackdropResult},
    paint::brush::Brush,
};

pub const DEFAULT_BLUR_RADIUS: f32 = 20.0;
pub const DEFAULT_NOISE_FACTOR: f32 = 0.15;

/// How the blurred content is treated at the consumer's edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurredEdgeTreatment {
    /// No clip; blur samples outside the content are transparent.
    Unbounded,
    /// Clip to the consumer's rectangle; blur samples clamp at the layer edge.
    #[default]
    Rectangle,
    /// Clip to a rounded rectangle covering the consumer.
    RoundedRect { corner_radius: f64 },
}

/// Partial effect configuration. `None` fields defer to the next style layer.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Style {
    pub blur_radius: Option<f32>,
    pub noise_factor: Option<f32>,
    pub mask: Option<Brush>,
    pub background_color: Option<Color>,
    pub tints: Option<Vec<Tint>>,
    pub fallback_tint: Option<Tint>,
    pub alpha: Option<f32>,
    pub progressive: Option<Progressive>,
    pub blurred_edge_treatment: Option<BlurredEdgeTreatment>,
    pub input_scale: Option<InputScale>,
    pub draw_content_behind: Option<bool>,
    pub blur_enabled: Option<bool>,
}

impl Style {
    pub fn from_json(s: &str) -> BackdropResult<Self> {
        let style: Self =
            serde_json::from_str(s).map_err(|e| BackdropError::serde(e.to_string()))?;
        style.validate()?;
        Ok(style)
    }

    pub fn to_json(&self) -> BackdropResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BackdropError::serde(e.to_string()))
    }

    pub fn validate(&self) -> BackdropResult<()> {
        if let Some(r) = self.blur_radius
            && (!r.is_finite() || r < 0.0)
        {
            return Err(BackdropError::validation(
                "blur_radius must be finite and >= 0",
            ));
        }
        if let Some(n) = self.noise_factor
            && !(0.0..=1.0).contains(&n)
        {
            return Err(BackdropError::validation("noise_factor must be in [0, 1]"));
        }
        if let Some(a) = self.alpha
            && !(0.0..=1.0).contains(&a)
        {
            return Err(BackdropError::validation("alpha must be in [0, 1]"));
        }
        if let Some(BlurredEdgeTreatment::RoundedRect { corner_radius }) =
            self.blurred_edge_treatment
            && (!corner_radius.is_finite() || corner_radius < 0.0)
        {
            return Err(BackdropError::validation(
                "corner_radius must be finite and >= 0",
            ));
        }
        if let Some(scale) = self.input_scale {
            scale.validate()?;
        }
        if let Some(p) = &self.progressive {
            p.validate()?;
        }
        Ok(())
    }

    /// Field-wise merge: values set on `self` win over `under`.
    pub fn merged_over(&self, under: &Style) -> Style {
        Style {
            blur_radius: self.blur_radius.or(under.blur_radius),
            noise_factor: self.noise_factor.or(under.noise_factor),
            mask: self.mask.clone().or_else(|| under.mask.clone()),
            background_color: self.background_color.or(under.background_color),
            tints: self.tints.clone().or_else(|| under.tints.clone()),
            fallback_tint: self
                .fallback_tint
                .clone()
                .or_else(|| under.fallback_tint.clone()),
            alpha: self.alpha.or(under.alpha),
            progressive: self
                .progressive
                .clone()
                .or_else(|| under.progressive.clone()),
            blurred_edge_treatment: self
                .blurred_edge_treatment
                .or(under.blurred_edge_treatment),
            input_scale: self.input_scale.or(under.input_scale),
            draw_content_behind: self.draw_content_behind.or(under.draw_content_behind),
            blur_enabled: self.blur_enabled.or(under.blur_enabled),
        }
    }
}

/// Fully resolved configuration of one consumer, with its own dirty tracker.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    blur_radius: f32,
    noise_factor: f32,
    mask: Option<Brush>,
    background_color: Option<Color>,
    tints: Vec<Tint>,
    fallback_tint: Option<Tint>,
    alpha: f32,
    progressive: Option<Progressive>,
    blurred_edge_treatment: BlurredEdgeTreatment,
    input_scale: InputScale,
    draw_content_behind: bool,
    blur_enabled: bool,
    dirty: DirtyTracker,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            blur_radius: DEFAULT_BLUR_RADIUS,
            noise_factor: DEFAULT_NOISE_FACTOR,
            mask: None,
            background_color: None,
            tints: Vec::new(),
            fallback_tint: None,
            alpha: 1.0,
            progressive: None,
            blurred_edge_treatment: BlurredEdgeTreatment::default(),
            input_scale: InputScale::default(),
            draw_content_behind: false,
            blur_enabled: true,
            dirty: DirtyTracker::default(),
        }
    }
}

impl ResolvedStyle {
    /// Resolve `instance > call_site > ambient > defaults` and write the result.
    ///
    /// `blur_enabled` defaults to whether the platform supports blur kernels.
    pub fn resolve(
        &mut self,
        instance: &Style,
        call_site: &Style,
        ambient: &Style,
        kernels_supported: bool,
    ) {
        let s = instance.merged_over(&call_site.merged_over(ambient));
        let d = &mut self.dirty;
        d.assign(
            &mut self.blur_radius,
            s.blur_radius.unwrap_or(DEFAULT_BLUR_RADIUS),
            DirtyFields::BLUR_RADIUS,
        );
        d.assign(
            &mut self.noise_factor,
            s.noise_factor.unwrap_or(DEFAULT_NOISE_FACTOR),
            DirtyFields::NOISE_FACTOR,
        );
        d.assign(&mut self.mask, s.mask, DirtyFields::MASK);
        d.assign(
            &mut self.background_color,
            s.background_color,
            DirtyFields::BACKGROUND_COLOR,
        );
        d.assign(&mut self.tints, s.tints.unwrap_or_default(), DirtyFields::TINTS);
        d.assign(
            &mut self.fallback_tint,
            s.fallback_tint,
            DirtyFields::FALLBACK_TINT,
        );
        d.assign(&mut self.alpha, s.alpha.unwrap_or(1.0), DirtyFields::ALPHA);
        d.assign(&mut self.progressive, s.progressive, DirtyFields::PROGRESSIVE);
        d.assign(
            &mut self.blurred_edge_treatment,
            s.blurred_edge_treatment.unwrap_or_default(),
            DirtyFields::EDGE_TREATMENT,
        );
        d.assign(
            &mut self.input_scale,
            s.input_scale.unwrap_or_default(),
            DirtyFields::INPUT_SCALE,
        );
        d.assign(
            &mut self.draw_content_behind,
            s.draw_content_behind.unwrap_or(false),
            DirtyFields::DRAW_CONTENT_BEHIND,
        );
        d.assign(
            &mut self.blur_enabled,
            s.blur_enabled.unwrap_or(kernels_supported),
            DirtyFields::BLUR_ENABLED,
        );
    }

    pub fn blur_radius(&self) -> f32 {
        self.blur_radius
    }

    pub fn noise_factor(&self) -> f32 {
        self.noise_factor
    }

    pub fn mask(&self) -> Option<&Brush> {
        self.mask.as_ref()
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn tints(&self) -> &[Tint] {
        &self.tints
    }

    pub fn fallback_tint(&self) -> Option<&Tint> {
        self.fallback_tint.as_ref()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn progressive(&self) -> Option<&Progressive> {
        self.progressive.as_ref()
    }

    pub fn blurred_edge_treatment(&self) -> BlurredEdgeTreatment {
        self.blurred_edge_treatment
    }

    pub fn input_scale(&self) -> InputScale {
        self.input_scale
    }

    pub fn draw_content_behind(&self) -> bool {
        self.draw_content_behind
    }

    pub fn blur_enabled(&self) -> bool {
        self.blur_enabled
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub(crate) fn dirty_mut(&mut self) -> &mut DirtyTracker {
        &mut self.dirty
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/style.rs"]
mod tests;
