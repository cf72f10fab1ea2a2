use crate::{
    effect::style::BlurredEdgeTreatment,
    effect::tint::Tint,
    foundation::core::IntSize,
    foundation::error::BackdropResult,
    paint::display_list::DisplayList,
};

/// Opaque handle to an offscreen layer owned by a [`LayerRecorder`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LayerId(pub u32);

/// Snapshot of a layer as seen by its recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerState {
    pub size: IntSize,
    pub released: bool,
}

impl LayerState {
    /// Whether the layer holds content that can be played back.
    pub fn is_drawable(self) -> bool {
        !self.released && !self.size.is_empty()
    }
}

/// Records display lists into sized, releasable offscreen layers.
///
/// Handles may be released behind the caller's back (e.g. when the graphics context reclaims
/// memory); callers validate them through [`LayerRecorder::layer_state`] at every use.
pub trait LayerRecorder {
    fn create_layer(&mut self) -> LayerId;

    fn record_layer(
        &mut self,
        layer: LayerId,
        size: IntSize,
        list: &DisplayList,
    ) -> BackdropResult<()>;

    /// `None` when the handle is unknown to this recorder.
    fn layer_state(&self, layer: LayerId) -> Option<LayerState>;

    fn release_layer(&mut self, layer: LayerId);

    /// Whether `layer` can be recorded into again.
    fn is_reusable(&self, layer: LayerId) -> bool {
        self.layer_state(layer).is_some_and(|s| !s.released)
    }
}

/// Parameters for a platform blur kernel.
#[derive(Clone, Debug, PartialEq)]
pub struct KernelRequest<'a> {
    /// Blur radius in density-independent units.
    pub radius: f32,
    pub density: f32,
    pub edge_treatment: BlurredEdgeTreatment,
    pub noise_factor: f32,
    pub tints: &'a [Tint],
}

/// A resolved blur filter attached to a layer at playback time.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    pub radius_px: f32,
    pub sigma: f32,
    /// `true` clamps samples at the layer edge; `false` treats outside pixels as transparent.
    pub clamp_edges: bool,
    pub noise_factor: f32,
    pub tints: Vec<Tint>,
}

impl Kernel {
    /// Default kernel shape for a request: sigma is half the pixel radius.
    pub fn from_request(req: &KernelRequest<'_>) -> Self {
        let radius_px = (req.radius * req.density).max(0.0);
        Self {
            radius_px,
            sigma: (radius_px / 2.0).max(f32::EPSILON),
            clamp_edges: !matches!(req.edge_treatment, BlurredEdgeTreatment::Unbounded),
            noise_factor: req.noise_factor.clamp(0.0, 1.0),
            tints: req.tints.to_vec(),
        }
    }
}

/// Supplies blur kernels. Returning `None` makes consumers fall back to a scrim.
pub trait KernelProvider {
    fn supports_kernels(&self) -> bool;

    fn create_kernel(&mut self, req: &KernelRequest<'_>) -> Option<Kernel>;
}

/// Provider for platforms without a blur primitive.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKernels;

impl KernelProvider for NoKernels {
    fn supports_kernels(&self) -> bool {
        false
    }

    fn create_kernel(&mut self, _req: &KernelRequest<'_>) -> Option<Kernel> {
        None
    }
}

/// Everything a consumer needs to draw: layer recording plus kernels.
pub trait RenderBackend: LayerRecorder + KernelProvider {}

impl<T: LayerRecorder + KernelProvider + ?Sized> RenderBackend for T {}

/// Host hook used to force a redraw of a consumer, e.g. when a producer in another window
/// is about to draw.
pub trait InvalidationSink {
    fn request_redraw(&mut self, effect: crate::EffectId);
}

impl InvalidationSink for Vec<crate::EffectId> {
    fn request_redraw(&mut self, effect: crate::EffectId) {
        if !self.contains(&effect) {
            self.push(effect);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
