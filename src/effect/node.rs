//! Consumer node: owns one effect's configuration and drives its update and draw passes.

use std::collections::BTreeSet;

use crate::{
    area::region::{AreaId, Placement},
    area::registry::{AreaPredicate, AreaRegistry, resolve_visible_areas},
    effect::compositor::{
        ContentLayer, ContentRequest, ContentSource, LayerBounds, build_content_layer,
        compute_layer_bounds,
    },
    effect::dirty::{DirtyFields, DirtyTracker},
    effect::input_scale::scale_for,
    effect::strategy::{
        DrawContext, DrawOutcome, StrategyHolder, StrategyKind, draw_scrim, select_strategy,
    },
    effect::style::{ResolvedStyle, Style},
    foundation::core::{IntSize, Point, Size, Vec2, WindowId},
    foundation::error::{BackdropError, BackdropResult},
    paint::display_list::DisplayList,
    render::backend::{LayerId, LayerRecorder, RenderBackend},
};

/// Handle of a consumer effect.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct EffectId(pub u32);

/// Environment shared by every consumer of a scene.
#[derive(Clone, Copy, Debug)]
pub struct EffectEnv<'a> {
    pub ambient: &'a Style,
    pub kernels_supported: bool,
    /// Pixels per unit.
    pub density: f32,
    /// Progressive band thickness in units.
    pub band_step: f64,
}

/// A consumer region drawing a backdrop effect from the areas behind it.
pub struct BackdropEffect {
    id: EffectId,
    areas: Vec<AreaId>,
    ancestor: Option<AreaId>,
    can_draw_area: Option<AreaPredicate>,
    instance_style: Style,
    call_site_style: Style,
    style: ResolvedStyle,

    position: Option<Point>,
    size: Size,
    window: Option<WindowId>,

    visible: Vec<AreaId>,
    area_offsets: Vec<(AreaId, Vec2)>,
    listening_to: BTreeSet<AreaId>,
    bounds: LayerBounds,
    input_scale: f32,
    strategy: StrategyHolder,

    content_layer: Option<LayerId>,
    own_layer: Option<LayerId>,

    dirty: DirtyTracker,
    attached: bool,
}

impl std::fmt::Debug for BackdropEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackdropEffect")
            .field("id", &self.id)
            .field("areas", &self.areas)
            .field("ancestor", &self.ancestor)
            .field("has_can_draw_area", &self.can_draw_area.is_some())
            .field("position", &self.position)
            .field("size", &self.size)
            .field("strategy", &self.strategy.kind())
            .field("dirty", &self.dirty)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}

impl BackdropEffect {
    pub fn new(id: EffectId) -> Self {
        let mut dirty = DirtyTracker::new();
        dirty.set(DirtyFields::INVALIDATE);
        Self {
            id,
            areas: Vec::new(),
            ancestor: None,
            can_draw_area: None,
            instance_style: Style::default(),
            call_site_style: Style::default(),
            style: ResolvedStyle::default(),
            position: None,
            size: Size::ZERO,
            window: None,
            visible: Vec::new(),
            area_offsets: Vec::new(),
            listening_to: BTreeSet::new(),
            bounds: LayerBounds::default(),
            input_scale: 1.0,
            strategy: StrategyHolder::default(),
            content_layer: None,
            own_layer: None,
            dirty,
            attached: true,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn style(&self) -> &ResolvedStyle {
        &self.style
    }

    pub fn areas(&self) -> &[AreaId] {
        &self.areas
    }

    /// Areas composited on the last update, in paint order.
    pub fn visible_areas(&self) -> &[AreaId] {
        &self.visible
    }

    /// Offset of each visible area relative to the consumer.
    pub fn area_offsets(&self) -> &[(AreaId, Vec2)] {
        &self.area_offsets
    }

    pub fn layer_bounds(&self) -> LayerBounds {
        self.bounds
    }

    pub fn input_scale(&self) -> f32 {
        self.input_scale
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn cached_kernels(&self) -> usize {
        self.strategy.current().cached_kernels()
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// Whether anything changed since the last completed draw.
    pub fn needs_redraw(&self) -> bool {
        self.dirty.any(DirtyFields::INVALIDATE)
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn content_layer(&self) -> Option<LayerId> {
        self.content_layer
    }

    pub fn place(&mut self, placement: Placement) {
        self.dirty
            .assign(&mut self.position, placement.position, DirtyFields::POSITION);
        self.dirty
            .assign(&mut self.size, placement.size, DirtyFields::SIZE);
        self.dirty
            .assign(&mut self.window, placement.window, DirtyFields::POSITION);
    }

    pub fn set_style(&mut self, style: Style) -> BackdropResult<()> {
        style.validate()?;
        self.instance_style = style;
        Ok(())
    }

    pub fn set_call_site_style(&mut self, style: Style) -> BackdropResult<()> {
        style.validate()?;
        self.call_site_style = style;
        Ok(())
    }

    /// Source areas; empty captures the consumer's own content instead.
    pub fn set_areas(&mut self, areas: Vec<AreaId>) {
        self.dirty.assign(&mut self.areas, areas, DirtyFields::AREAS);
    }

    /// Producer area the consumer is drawn inside, if any.
    pub fn set_ancestor(&mut self, ancestor: Option<AreaId>) {
        self.dirty
            .assign(&mut self.ancestor, ancestor, DirtyFields::AREAS);
    }

    pub fn set_can_draw_area(&mut self, predicate: Option<AreaPredicate>) {
        self.can_draw_area = predicate;
        self.dirty.set(DirtyFields::AREAS);
    }

    /// Mark captured producer content as changed.
    pub(crate) fn invalidate_content(&mut self) {
        self.dirty.set(DirtyFields::AREA_CONTENT);
    }

    /// Recompute everything derived from configuration, placement and the area registry.
    #[tracing::instrument(level = "debug", skip_all, fields(effect = ?self.id))]
    pub fn update(&mut self, registry: &mut AreaRegistry, env: &EffectEnv<'_>) -> BackdropResult<()> {
        self.ensure_attached()?;

        self.style.resolve(
            &self.instance_style,
            &self.call_site_style,
            env.ambient,
            env.kernels_supported,
        );
        self.style.dirty().propagate_into(&mut self.dirty);
        self.style.dirty_mut().clear();

        self.update_areas(registry);

        let scale = scale_for(
            self.style.input_scale(),
            self.style.blur_radius(),
            self.style.progressive().is_some(),
            self.style.mask().is_some(),
        );
        self.dirty
            .assign(&mut self.input_scale, scale, DirtyFields::INPUT_SCALE);

        let radius_px = f64::from(self.style.blur_radius() * env.density);
        let bounds = compute_layer_bounds(self.size, radius_px, self.style.blur_enabled());
        self.dirty
            .assign(&mut self.bounds.size, bounds.size, DirtyFields::LAYER_SIZE);
        self.dirty
            .assign(&mut self.bounds.offset, bounds.offset, DirtyFields::LAYER_OFFSET);

        let kind = select_strategy(
            self.style.blur_enabled(),
            env.kernels_supported,
            self.style.progressive().is_some(),
        );
        if self.strategy.swap(kind) {
            self.dirty.set(DirtyFields::STRATEGY);
        }
        Ok(())
    }

    fn update_areas(&mut self, registry: &mut AreaRegistry) {
        let ancestor_z = self
            .ancestor
            .and_then(|id| registry.get(id))
            .map(|a| a.z_index());
        let visible: Vec<AreaId> = resolve_visible_areas(
            registry.lookup(&self.areas),
            ancestor_z,
            self.can_draw_area.as_deref(),
        )
        .into_iter()
        .map(|a| a.id())
        .collect();

        let origin = self.position.unwrap_or(Point::ZERO);
        let offsets: Vec<(AreaId, Vec2)> = visible
            .iter()
            .filter_map(|&id| {
                let position = registry.get(id)?.position()?;
                Some((id, position - origin))
            })
            .collect();

        // Areas in another window draw in a different invalidation scope; listen to them so
        // the consumer is redrawn when they are.
        let cross_window: BTreeSet<AreaId> = visible
            .iter()
            .copied()
            .filter(|&id| registry.get(id).is_some_and(|a| a.window() != self.window))
            .collect();
        for &gone in self.listening_to.difference(&cross_window) {
            if let Some(area) = registry.get_mut(gone) {
                area.remove_listener(self.id);
            }
        }
        for &id in &cross_window {
            if let Some(area) = registry.get_mut(id) {
                area.add_listener(self.id);
            }
        }
        self.listening_to = cross_window;

        self.dirty.assign(&mut self.visible, visible, DirtyFields::AREAS);
        self.dirty
            .assign(&mut self.area_offsets, offsets, DirtyFields::AREA_OFFSETS);
    }

    /// Draw the effect into a consumer-local display list.
    ///
    /// `content` is what the consumer itself draws. With source areas it is drawn on top of
    /// the effect, or beneath it when `draw_content_behind` is set. Without source areas it
    /// is the captured content the effect is applied to.
    ///
    /// The dirty tracker is drained once the draw completes.
    #[tracing::instrument(level = "debug", skip_all, fields(effect = ?self.id))]
    pub fn draw<B: RenderBackend + ?Sized>(
        &mut self,
        registry: &AreaRegistry,
        backend: &mut B,
        env: &EffectEnv<'_>,
        content: &DisplayList,
    ) -> BackdropResult<DisplayList> {
        self.ensure_attached()?;
        let mut list = DisplayList::new();
        if IntSize::ceil_from(self.size).is_empty() {
            tracing::trace!("zero-size consumer, skipping draw");
            return Ok(list);
        }

        let self_capture = self.areas.is_empty();
        let mut kind = self.strategy.kind();
        let content_is_source = self_capture && kind.needs_content();
        let content_behind = self.style.draw_content_behind() || self_capture;

        if content_behind && !content_is_source {
            list.append(content);
        }

        let mut effect = DisplayList::new();
        let captured = if kind.needs_content() {
            self.capture(registry, backend, content, self_capture)?
        } else {
            None
        };
        if kind.needs_content() {
            let ctx = DrawContext {
                style: &self.style,
                dirty: self.dirty,
                size: self.size,
                bounds: self.bounds,
                content: captured,
                density: env.density,
                band_step: env.band_step,
            };
            if self.strategy.draw(backend, &ctx, &mut effect) == DrawOutcome::NoKernel {
                tracing::debug!("kernel unavailable, drawing scrim");
                kind = StrategyKind::Scrim;
            }
        }
        if kind == StrategyKind::Scrim {
            if content_is_source {
                // The captured content is not drawn by the strategy; show it under the scrim.
                list.append(content);
            }
            draw_scrim(&self.style, self.size, &mut effect);
        }
        list.append(&effect);

        if !content_behind && !content_is_source {
            list.append(content);
        }

        self.dirty.clear();
        Ok(list)
    }

    fn capture<B: RenderBackend + ?Sized>(
        &mut self,
        registry: &AreaRegistry,
        backend: &mut B,
        content: &DisplayList,
        self_capture: bool,
    ) -> BackdropResult<Option<ContentLayer>> {
        let position = self.position.unwrap_or(Point::ZERO);
        let own;
        let areas: Vec<ContentSource<'_>>;
        let sources: &[ContentSource<'_>] = if self_capture {
            let layer = match self.own_layer {
                Some(layer) if backend.is_reusable(layer) => layer,
                _ => backend.create_layer(),
            };
            self.own_layer = Some(layer);
            backend.record_layer(layer, IntSize::ceil_from(self.size), content)?;
            own = [ContentSource::Own {
                layer,
                position,
                size: self.size,
            }];
            &own
        } else {
            areas = registry
                .lookup(&self.visible)
                .map(ContentSource::Area)
                .collect();
            &areas
        };
        if sources.is_empty() {
            tracing::trace!("no visible areas, skipping background");
            return Ok(None);
        }

        let req = ContentRequest {
            bounds: self.bounds,
            position,
            scale: self.input_scale,
            background: self.style.background_color(),
            sources,
        };
        let built = build_content_layer(backend, self.content_layer, &req)?;
        if let Some(layer) = built {
            self.content_layer = Some(layer.id);
        }
        Ok(built)
    }

    /// Release retained layers, unregister listeners and refuse further draws.
    pub fn detach<R: LayerRecorder + ?Sized>(
        &mut self,
        registry: &mut AreaRegistry,
        recorder: &mut R,
    ) {
        for id in std::mem::take(&mut self.listening_to) {
            if let Some(area) = registry.get_mut(id) {
                area.remove_listener(self.id);
            }
        }
        for layer in [self.content_layer.take(), self.own_layer.take()]
            .into_iter()
            .flatten()
        {
            recorder.release_layer(layer);
        }
        self.strategy.detach();
        self.attached = false;
    }

    fn ensure_attached(&self) -> BackdropResult<()> {
        if self.attached {
            Ok(())
        } else {
            Err(BackdropError::detached(format!("{:?} is detached", self.id)))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/node.rs"]
mod tests;
