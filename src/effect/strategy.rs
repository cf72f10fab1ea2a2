//! Effect strategies.
//!
//! A consumer draws with exactly one strategy at a time. The choice is re-evaluated on every
//! update; swapping detaches the old strategy, which drops its cached kernels, before the
//! new one is attached. Drawing is a single `match` over [`Strategy`].

use std::collections::BTreeMap;

use crate::{
    effect::compositor::{Clip, ContentLayer, LayerBounds, draw_scaled_content},
    effect::dirty::{DirtyFields, DirtyTracker},
    effect::progressive::generate_bands,
    effect::style::ResolvedStyle,
    effect::tint::{Tint, draw_overlay, scrim_tint},
    foundation::core::{Size, Vec2},
    paint::display_list::{BlendMode, DisplayList, LayerPaint},
    render::backend::{Kernel, KernelProvider, KernelRequest},
};

/// Which strategy a consumer should draw with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    FullKernel,
    Progressive,
    Scrim,
}

impl StrategyKind {
    /// Whether the strategy composites captured content.
    pub fn needs_content(self) -> bool {
        !matches!(self, Self::Scrim)
    }
}

pub fn select_strategy(
    blur_enabled: bool,
    kernels_supported: bool,
    has_progressive: bool,
) -> StrategyKind {
    if !blur_enabled || !kernels_supported {
        StrategyKind::Scrim
    } else if has_progressive {
        StrategyKind::Progressive
    } else {
        StrategyKind::FullKernel
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FullKernelState {
    kernel: Option<Kernel>,
}

/// Per-band kernels keyed by quantised intensity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressiveState {
    kernels: BTreeMap<u16, Kernel>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Strategy {
    FullKernel(FullKernelState),
    Progressive(ProgressiveState),
    Scrim,
}

impl Strategy {
    fn attach(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::FullKernel => Self::FullKernel(FullKernelState::default()),
            StrategyKind::Progressive => Self::Progressive(ProgressiveState::default()),
            StrategyKind::Scrim => Self::Scrim,
        }
    }

    fn detach(&mut self) {
        match self {
            Self::FullKernel(state) => state.kernel = None,
            Self::Progressive(state) => state.kernels.clear(),
            Self::Scrim => {}
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::FullKernel(_) => StrategyKind::FullKernel,
            Self::Progressive(_) => StrategyKind::Progressive,
            Self::Scrim => StrategyKind::Scrim,
        }
    }

    /// Number of kernels currently cached.
    pub fn cached_kernels(&self) -> usize {
        match self {
            Self::FullKernel(state) => usize::from(state.kernel.is_some()),
            Self::Progressive(state) => state.kernels.len(),
            Self::Scrim => 0,
        }
    }
}

/// Owns the active strategy and runs the attach/detach lifecycle on swaps.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyHolder {
    current: Strategy,
}

impl Default for StrategyHolder {
    fn default() -> Self {
        Self {
            current: Strategy::Scrim,
        }
    }
}

impl StrategyHolder {
    pub fn current(&self) -> &Strategy {
        &self.current
    }

    pub fn kind(&self) -> StrategyKind {
        self.current.kind()
    }

    /// Switch to `kind`. Returns `false` when it is already active.
    pub fn swap(&mut self, kind: StrategyKind) -> bool {
        if self.current.kind() == kind {
            return false;
        }
        tracing::debug!(from = ?self.current.kind(), to = ?kind, "swap effect strategy");
        self.current.detach();
        self.current = Strategy::attach(kind);
        true
    }

    /// Drop cached state without changing the strategy.
    pub fn detach(&mut self) {
        self.current.detach();
    }

    /// Draw with the active strategy.
    pub fn draw<K: KernelProvider + ?Sized>(
        &mut self,
        kernels: &mut K,
        ctx: &DrawContext<'_>,
        list: &mut DisplayList,
    ) -> DrawOutcome {
        match &mut self.current {
            Strategy::FullKernel(state) => draw_full_kernel(state, kernels, ctx, list),
            Strategy::Progressive(state) => draw_progressive(state, kernels, ctx, list),
            Strategy::Scrim => {
                draw_scrim(ctx.style, ctx.size, list);
                DrawOutcome::Drawn
            }
        }
    }
}

/// Everything a strategy reads while drawing.
#[derive(Clone, Copy, Debug)]
pub struct DrawContext<'a> {
    pub style: &'a ResolvedStyle,
    /// Node-level dirty bits accumulated since the last completed draw.
    pub dirty: DirtyTracker,
    /// Consumer size in local units.
    pub size: Size,
    pub bounds: LayerBounds,
    pub content: Option<ContentLayer>,
    pub density: f32,
    /// Band thickness in units, before density.
    pub band_step: f64,
}

impl DrawContext<'_> {
    fn kernel_request<'t>(&self, radius: f32, tints: &'t [Tint]) -> KernelRequest<'t> {
        KernelRequest {
            radius,
            density: self.density,
            edge_treatment: self.style.blurred_edge_treatment(),
            noise_factor: self.style.noise_factor(),
            tints,
        }
    }

    fn clip(&self) -> Option<Clip> {
        Clip::for_edge(self.style.blurred_edge_treatment(), self.size)
    }
}

/// Result of a strategy draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn,
    /// The provider returned no kernel; nothing was recorded and the caller should draw a
    /// scrim instead.
    NoKernel,
}

fn draw_full_kernel<K: KernelProvider + ?Sized>(
    state: &mut FullKernelState,
    kernels: &mut K,
    ctx: &DrawContext<'_>,
    list: &mut DisplayList,
) -> DrawOutcome {
    if state.kernel.is_none() || ctx.dirty.any(DirtyFields::KERNEL_AFFECTING) {
        let req = ctx.kernel_request(ctx.style.blur_radius(), ctx.style.tints());
        state.kernel = kernels.create_kernel(&req);
        tracing::trace!(recreated = state.kernel.is_some(), "full kernel");
    }
    let Some(kernel) = state.kernel.clone() else {
        return DrawOutcome::NoKernel;
    };
    let Some(content) = ctx.content else {
        tracing::trace!("no content layer, skipping blur");
        return DrawOutcome::Drawn;
    };
    let paint = LayerPaint {
        kernel: Some(kernel),
        alpha: ctx.style.alpha(),
        mask: ctx.style.mask().cloned(),
    };
    draw_scaled_content(
        list,
        content,
        ctx.bounds.offset,
        ctx.bounds.size,
        ctx.clip(),
        paint,
    );
    DrawOutcome::Drawn
}

/// Quantise an intensity into a kernel cache key.
fn intensity_key(intensity: f32) -> u16 {
    (intensity.clamp(0.0, 1.0) * 1000.0).round() as u16
}

fn progressive_kernel<K: KernelProvider + ?Sized>(
    state: &mut ProgressiveState,
    kernels: &mut K,
    ctx: &DrawContext<'_>,
    intensity: f32,
) -> Option<Kernel> {
    let key = intensity_key(intensity);
    if let Some(kernel) = state.kernels.get(&key) {
        return Some(kernel.clone());
    }
    let tints: Vec<Tint> = ctx
        .style
        .tints()
        .iter()
        .map(|t| t.scale_alpha(intensity))
        .collect();
    let req = ctx.kernel_request(ctx.style.blur_radius() * intensity, &tints);
    let kernel = kernels.create_kernel(&req)?;
    state.kernels.insert(key, kernel.clone());
    Some(kernel)
}

fn draw_progressive<K: KernelProvider + ?Sized>(
    state: &mut ProgressiveState,
    kernels: &mut K,
    ctx: &DrawContext<'_>,
    list: &mut DisplayList,
) -> DrawOutcome {
    if ctx.dirty.any(DirtyFields::KERNEL_AFFECTING) {
        state.kernels.clear();
    }
    let Some(spec) = ctx.style.progressive() else {
        return draw_full_kernel(&mut FullKernelState::default(), kernels, ctx, list);
    };

    // Kernels are resolved before anything is recorded so a missing kernel leaves the list
    // untouched for the scrim fallback.
    let steps = if spec.prefers_performance() {
        let Some(kernel) = progressive_kernel(state, kernels, ctx, 1.0) else {
            return DrawOutcome::NoKernel;
        };
        vec![(kernel, spec.approximation_mask(ctx.size))]
    } else {
        let step = ctx.band_step * f64::from(ctx.density);
        let mut steps = Vec::new();
        for band in generate_bands(spec, ctx.size, step) {
            let Some(kernel) = progressive_kernel(state, kernels, ctx, band.intensity) else {
                return DrawOutcome::NoKernel;
            };
            steps.push((kernel, band.mask));
        }
        steps
    };

    let Some(content) = ctx.content else {
        tracing::trace!("no content layer, skipping progressive blur");
        return DrawOutcome::Drawn;
    };
    tracing::trace!(bands = steps.len(), "progressive blur");
    for (kernel, mask) in steps {
        let paint = LayerPaint {
            kernel: Some(kernel),
            alpha: ctx.style.alpha(),
            mask: Some(mask),
        };
        draw_scaled_content(
            list,
            content,
            ctx.bounds.offset,
            ctx.bounds.size,
            ctx.clip(),
            paint,
        );
    }
    DrawOutcome::Drawn
}

/// Flat overlay standing in for the blur.
///
/// The overlay is masked by the style mask, or by the progressive gradient's single-mask
/// approximation when only a progressive gradient is set.
pub fn draw_scrim(style: &ResolvedStyle, size: Size, list: &mut DisplayList) {
    let Some(tint) = scrim_tint(style.fallback_tint(), style.tints(), style.blur_radius()) else {
        tracing::trace!("scrim has no tint, drawing nothing");
        return;
    };
    let mask = style
        .mask()
        .cloned()
        .or_else(|| style.progressive().map(|p| p.approximation_mask(size)));
    match (&tint, mask) {
        // The destination-in pass of a brush tint must only see the tint.
        (Tint::Brush { .. }, Some(mask)) => list.with_group(BlendMode::SrcOver, |group| {
            draw_overlay(group, &tint, size, Vec2::ZERO, Some(&mask));
        }),
        (_, mask) => draw_overlay(list, &tint, size, Vec2::ZERO, mask.as_ref()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/strategy.rs"]
mod tests;
