//! Scene facade owning every producer area and consumer effect of one host surface.

use std::collections::BTreeMap;

use crate::{
    area::region::{Area, AreaId, Placement},
    area::registry::{AreaPredicate, AreaRegistry},
    effect::node::{BackdropEffect, EffectEnv, EffectId},
    effect::progressive::DEFAULT_BAND_STEP,
    effect::style::Style,
    foundation::error::{BackdropError, BackdropResult},
    paint::display_list::DisplayList,
    render::backend::{InvalidationSink, KernelProvider, LayerRecorder, RenderBackend},
};

/// Scene-wide settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackdropOpts {
    /// Pixels per unit; blur radii and band steps are given in units.
    pub density: f32,
    /// Progressive band thickness, in units.
    pub band_step: f64,
}

impl Default for BackdropOpts {
    fn default() -> Self {
        Self {
            density: 1.0,
            band_step: DEFAULT_BAND_STEP,
        }
    }
}

impl BackdropOpts {
    pub fn validate(&self) -> BackdropResult<()> {
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(BackdropError::validation("density must be finite and > 0"));
        }
        if !self.band_step.is_finite() || self.band_step <= 0.0 {
            return Err(BackdropError::validation("band_step must be finite and > 0"));
        }
        Ok(())
    }
}

/// Producer areas and consumer effects, with the operations a host drives them by.
///
/// A frame looks like: place and configure, [`Backdrop::update_effect`] for every consumer,
/// then record each area between [`Backdrop::begin_area_draw`] and
/// [`Backdrop::finish_area_draw`] and call [`Backdrop::draw_effect`] where each consumer
/// paints.
#[derive(Debug)]
pub struct Backdrop {
    opts: BackdropOpts,
    ambient: Style,
    areas: AreaRegistry,
    effects: BTreeMap<EffectId, BackdropEffect>,
    next_effect: u32,
}

impl Backdrop {
    pub fn new(opts: BackdropOpts) -> BackdropResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            ambient: Style::default(),
            areas: AreaRegistry::new(),
            effects: BTreeMap::new(),
            next_effect: 0,
        })
    }

    pub fn opts(&self) -> BackdropOpts {
        self.opts
    }

    pub fn ambient_style(&self) -> &Style {
        &self.ambient
    }

    /// Lowest-priority style layer, shared by every consumer.
    pub fn set_ambient_style(&mut self, style: Style) -> BackdropResult<()> {
        style.validate()?;
        self.ambient = style;
        Ok(())
    }

    pub fn areas(&self) -> &AreaRegistry {
        &self.areas
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id)
    }

    pub fn add_area(&mut self, z_index: f32) -> AreaId {
        let id = self.areas.insert(z_index);
        tracing::debug!(area = ?id, z_index, "add area");
        id
    }

    /// Remove an area and release its content layer. Consumers drop it on their next update.
    pub fn remove_area<R: LayerRecorder + ?Sized>(
        &mut self,
        id: AreaId,
        recorder: &mut R,
    ) -> BackdropResult<()> {
        let mut area = self
            .areas
            .remove(id)
            .ok_or_else(|| unknown_area(id))?;
        area.release_content(recorder);
        self.invalidate_consumers_of(id);
        Ok(())
    }

    pub fn place_area(&mut self, id: AreaId, placement: Placement) -> BackdropResult<()> {
        self.areas.require_mut(id)?.place(placement);
        Ok(())
    }

    pub fn set_area_z(&mut self, id: AreaId, z_index: f32) -> BackdropResult<()> {
        self.areas.require_mut(id)?.set_z_index(z_index);
        Ok(())
    }

    /// Mark `id` as recording and ask the host to redraw every consumer listening to it.
    ///
    /// While recording, the area cannot be composited; a consumer drawn inside it that lists
    /// it as a source fails with a graph error.
    pub fn begin_area_draw(
        &mut self,
        id: AreaId,
        sink: &mut dyn InvalidationSink,
    ) -> BackdropResult<()> {
        let area = self.areas.require_mut(id)?;
        area.begin_recording();
        for effect in area.pre_draw_listeners() {
            tracing::trace!(area = ?id, ?effect, "pre-draw invalidation");
            sink.request_redraw(effect);
        }
        Ok(())
    }

    /// Record `content` (area-local coordinates) as the area's captured content and end
    /// recording. Consumers compositing the area are invalidated.
    pub fn finish_area_draw<R: LayerRecorder + ?Sized>(
        &mut self,
        id: AreaId,
        recorder: &mut R,
        content: &DisplayList,
    ) -> BackdropResult<()> {
        let area = self.areas.require_mut(id)?;
        let size = area.content_size();
        let recorded = if size.is_empty() {
            tracing::trace!(area = ?id, "zero-size area, skipping recording");
            Ok(())
        } else {
            let layer = area.ensure_content_layer(recorder);
            recorder.record_layer(layer, size, content)
        };
        area.end_recording();
        recorded?;
        self.invalidate_consumers_of(id);
        Ok(())
    }

    pub fn effect(&self, id: EffectId) -> Option<&BackdropEffect> {
        self.effects.get(&id)
    }

    pub fn effects(&self) -> impl Iterator<Item = &BackdropEffect> {
        self.effects.values()
    }

    pub fn add_effect(&mut self) -> EffectId {
        let id = EffectId(self.next_effect);
        self.next_effect = self.next_effect.wrapping_add(1);
        self.effects.insert(id, BackdropEffect::new(id));
        tracing::debug!(effect = ?id, "add effect");
        id
    }

    /// Detach and drop a consumer, releasing its layers.
    pub fn remove_effect<R: LayerRecorder + ?Sized>(
        &mut self,
        id: EffectId,
        recorder: &mut R,
    ) -> BackdropResult<()> {
        let mut effect = self
            .effects
            .remove(&id)
            .ok_or_else(|| unknown_effect(id))?;
        effect.detach(&mut self.areas, recorder);
        Ok(())
    }

    pub fn place_effect(&mut self, id: EffectId, placement: Placement) -> BackdropResult<()> {
        self.effect_mut(id)?.place(placement);
        Ok(())
    }

    pub fn set_effect_style(&mut self, id: EffectId, style: Style) -> BackdropResult<()> {
        self.effect_mut(id)?.set_style(style)
    }

    pub fn set_call_site_style(&mut self, id: EffectId, style: Style) -> BackdropResult<()> {
        self.effect_mut(id)?.set_call_site_style(style)
    }

    /// Source areas of a consumer. An empty list makes it blur its own content.
    pub fn set_effect_areas(&mut self, id: EffectId, areas: Vec<AreaId>) -> BackdropResult<()> {
        self.effect_mut(id)?.set_areas(areas);
        Ok(())
    }

    /// The producer area the consumer is drawn inside, if any.
    pub fn set_effect_ancestor(
        &mut self,
        id: EffectId,
        ancestor: Option<AreaId>,
    ) -> BackdropResult<()> {
        self.effect_mut(id)?.set_ancestor(ancestor);
        Ok(())
    }

    pub fn set_can_draw_area(
        &mut self,
        id: EffectId,
        predicate: Option<AreaPredicate>,
    ) -> BackdropResult<()> {
        self.effect_mut(id)?.set_can_draw_area(predicate);
        Ok(())
    }

    /// Recompute a consumer's derived state after layout or configuration changes.
    pub fn update_effect<K: KernelProvider + ?Sized>(
        &mut self,
        id: EffectId,
        kernels: &K,
    ) -> BackdropResult<()> {
        let env = EffectEnv {
            ambient: &self.ambient,
            kernels_supported: kernels.supports_kernels(),
            density: self.opts.density,
            band_step: self.opts.band_step,
        };
        let effect = self.effects.get_mut(&id).ok_or_else(|| unknown_effect(id))?;
        effect.update(&mut self.areas, &env)
    }

    pub fn update_all<K: KernelProvider + ?Sized>(&mut self, kernels: &K) -> BackdropResult<()> {
        let env = EffectEnv {
            ambient: &self.ambient,
            kernels_supported: kernels.supports_kernels(),
            density: self.opts.density,
            band_step: self.opts.band_step,
        };
        for effect in self.effects.values_mut() {
            effect.update(&mut self.areas, &env)?;
        }
        Ok(())
    }

    /// Draw a consumer into a display list in its local coordinates.
    ///
    /// `content` is what the consumer itself paints; see [`BackdropEffect::draw`].
    pub fn draw_effect<B: RenderBackend + ?Sized>(
        &mut self,
        id: EffectId,
        backend: &mut B,
        content: &DisplayList,
    ) -> BackdropResult<DisplayList> {
        let env = EffectEnv {
            ambient: &self.ambient,
            kernels_supported: backend.supports_kernels(),
            density: self.opts.density,
            band_step: self.opts.band_step,
        };
        let effect = self.effects.get_mut(&id).ok_or_else(|| unknown_effect(id))?;
        effect.draw(&self.areas, backend, &env, content)
    }

    fn effect_mut(&mut self, id: EffectId) -> BackdropResult<&mut BackdropEffect> {
        self.effects.get_mut(&id).ok_or_else(|| unknown_effect(id))
    }

    fn invalidate_consumers_of(&mut self, area: AreaId) {
        for effect in self.effects.values_mut() {
            if effect.visible_areas().contains(&area) {
                effect.invalidate_content();
            }
        }
    }
}

impl Default for Backdrop {
    fn default() -> Self {
        Self {
            opts: BackdropOpts::default(),
            ambient: Style::default(),
            areas: AreaRegistry::new(),
            effects: BTreeMap::new(),
            next_effect: 0,
        }
    }
}

fn unknown_area(id: AreaId) -> BackdropError {
    BackdropError::detached(format!("unknown area {id:?}"))
}

fn unknown_effect(id: EffectId) -> BackdropError {
    BackdropError::detached(format!("unknown effect {id:?}"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/backdrop.rs"]
mod tests;
