use std::collections::BTreeMap;

use super::*;
use crate::{
    effect::tint::Tint,
    foundation::core::{Color, Rect},
    paint::brush::Brush,
    paint::display_list::{BlendMode, DrawOp},
    render::backend::{Kernel, KernelProvider, KernelRequest, LayerState},
};

#[derive(Default)]
struct Backend {
    next: u32,
    layers: BTreeMap<LayerId, LayerState>,
    kernels: bool,
    refuse_kernels: bool,
}

impl Backend {
    fn with_kernels() -> Self {
        Self {
            kernels: true,
            ..Self::default()
        }
    }
}

impl LayerRecorder for Backend {
    fn create_layer(&mut self) -> LayerId {
        self.next += 1;
        let id = LayerId(self.next);
        self.layers.insert(
            id,
            LayerState {
                size: IntSize::ZERO,
                released: false,
            },
        );
        id
    }

    fn record_layer(&mut self, layer: LayerId, size: IntSize, _: &DisplayList) -> BackdropResult<()> {
        if let Some(state) = self.layers.get_mut(&layer) {
            state.size = size;
        }
        Ok(())
    }

    fn layer_state(&self, layer: LayerId) -> Option<LayerState> {
        self.layers.get(&layer).copied()
    }

    fn release_layer(&mut self, layer: LayerId) {
        if let Some(state) = self.layers.get_mut(&layer) {
            state.released = true;
        }
    }
}

impl KernelProvider for Backend {
    fn supports_kernels(&self) -> bool {
        self.kernels
    }

    fn create_kernel(&mut self, req: &KernelRequest<'_>) -> Option<Kernel> {
        (self.kernels && !self.refuse_kernels).then(|| Kernel::from_request(req))
    }
}

fn env(ambient: &Style, kernels_supported: bool) -> EffectEnv<'_> {
    EffectEnv {
        ambient,
        kernels_supported,
        density: 1.0,
        band_step: 64.0,
    }
}

fn produced_area(reg: &mut AreaRegistry, backend: &mut Backend, z: f32, at: Point) -> AreaId {
    let id = reg.insert(z);
    let area = reg.get_mut(id).unwrap();
    area.place(Placement::at(at, Size::new(100.0, 100.0)));
    let layer = area.ensure_content_layer(backend);
    backend
        .record_layer(layer, IntSize::new(100, 100), &DisplayList::new())
        .unwrap();
    id
}

fn content() -> DisplayList {
    let mut list = DisplayList::new();
    list.fill_rect(
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Brush::solid(Color::WHITE),
        BlendMode::SrcOver,
    );
    list
}

fn radius(r: f32) -> Style {
    Style {
        blur_radius: Some(r),
        ..Style::default()
    }
}

#[test]
fn one_area_inflates_bounds_by_radius() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let area = produced_area(&mut reg, &mut backend, 0.0, Point::ZERO);

    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(100.0, 100.0)));
    effect.set_areas(vec![area]);
    effect.set_style(radius(10.0)).unwrap();
    effect.update(&mut reg, &env(&ambient, true)).unwrap();

    let bounds = effect.layer_bounds();
    assert_eq!(bounds.size, Size::new(120.0, 120.0));
    assert_eq!(bounds.offset, Vec2::new(10.0, 10.0));
    assert_eq!(effect.input_scale(), 1.0);
    assert_eq!(effect.strategy(), StrategyKind::FullKernel);
    assert_eq!(effect.visible_areas(), &[area]);

    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    let layer = effect.content_layer().unwrap();
    assert_eq!(
        backend.layer_state(layer).map(|s| s.size),
        Some(IntSize::new(120, 120))
    );
    assert!(list.ops().iter().any(|op| matches!(
        op,
        DrawOp::DrawLayer { layer: l, paint, .. } if *l == layer && paint.kernel.is_some()
    )));
}

#[test]
fn draw_drains_dirty_bits_once() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert!(effect.needs_redraw());

    effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    assert!(effect.dirty().is_empty());

    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert!(!effect.needs_redraw());

    effect.set_style(radius(3.0)).unwrap();
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert!(effect.dirty().contains(DirtyFields::BLUR_RADIUS));
    assert!(effect.dirty().any(DirtyFields::KERNEL_AFFECTING));
}

#[test]
fn zero_size_draw_is_skipped_and_keeps_dirty_bits() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    assert!(list.is_empty());
    assert!(effect.needs_redraw());
}

#[test]
fn ancestor_hides_areas_drawn_above_it() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let below = produced_area(&mut reg, &mut backend, 0.0, Point::ZERO);
    let parent = produced_area(&mut reg, &mut backend, 1.0, Point::ZERO);
    let above = produced_area(&mut reg, &mut backend, 2.0, Point::ZERO);

    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::new(10.0, 20.0), Size::new(50.0, 50.0)));
    effect.set_areas(vec![above, parent, below]);
    effect.set_ancestor(Some(parent));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(effect.visible_areas(), &[below]);
    assert_eq!(effect.area_offsets(), &[(below, Vec2::new(-10.0, -20.0))]);

    effect.set_can_draw_area(Some(Box::new(|_: &crate::area::region::Area| true)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(effect.visible_areas(), &[below, parent, above]);
}

#[test]
fn no_visible_areas_composites_no_background() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let card = produced_area(&mut reg, &mut backend, 1.0, Point::ZERO);
    let above = produced_area(&mut reg, &mut backend, 5.0, Point::ZERO);
    let layers_before = backend.layers.len();

    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(50.0, 50.0)));
    effect.set_areas(vec![above]);
    effect.set_ancestor(Some(card));
    effect
        .set_style(Style {
            background_color: Some(Color::WHITE),
            ..radius(10.0)
        })
        .unwrap();
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert!(effect.visible_areas().is_empty());

    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    assert_eq!(effect.content_layer(), None);
    assert_eq!(backend.layers.len(), layers_before);
    assert!(!list
        .ops()
        .iter()
        .any(|op| matches!(op, DrawOp::DrawLayer { .. })));
}

#[test]
fn composing_a_recording_area_is_a_graph_error() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let parent = produced_area(&mut reg, &mut backend, 0.0, Point::ZERO);

    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(50.0, 50.0)));
    effect.set_areas(vec![parent]);
    effect.update(&mut reg, &env(&ambient, true)).unwrap();

    reg.get_mut(parent).unwrap().begin_recording();
    let err = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn scrim_without_kernels_uses_fallback_tint() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::default();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect
        .set_style(Style {
            fallback_tint: Some(Tint::color(Color::BLACK.with_alpha(0.25))),
            ..Style::default()
        })
        .unwrap();
    effect.update(&mut reg, &env(&ambient, false)).unwrap();
    assert_eq!(effect.strategy(), StrategyKind::Scrim);

    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, false), &content())
        .unwrap();
    // Own content first, then the scrim over it.
    assert_eq!(list.len(), 2);
    assert!(matches!(
        &list.ops()[1],
        DrawOp::FillRect { brush: Brush::Solid { color }, .. } if color.a == 0.25
    ));
    assert_eq!(backend.next, 0);
}

#[test]
fn scrim_without_tints_draws_only_content() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::default();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, false)).unwrap();
    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, false), &content())
        .unwrap();
    assert_eq!(list, content());
}

#[test]
fn missing_kernel_at_draw_time_falls_back_to_scrim() {
    let ambient = Style {
        tints: Some(vec![Tint::color(Color::WHITE.with_alpha(0.5))]),
        ..Style::default()
    };
    let mut reg = AreaRegistry::new();
    let mut backend = Backend {
        refuse_kernels: true,
        ..Backend::with_kernels()
    };
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(effect.strategy(), StrategyKind::FullKernel);

    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    assert_eq!(list.ops()[0], content().ops()[0]);
    assert!(matches!(
        &list.ops()[1],
        DrawOp::FillRect { brush: Brush::Solid { color }, .. } if color.a > 0.5
    ));
}

#[test]
fn self_capture_replaces_content_with_blurred_copy() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::new(5.0, 5.0), Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    let list = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    assert_eq!(list.layers().count(), 1);
    assert!(!list.ops().iter().any(|op| matches!(op, DrawOp::FillRect { .. })));
}

#[test]
fn content_order_follows_draw_content_behind() {
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let area = produced_area(&mut reg, &mut backend, 0.0, Point::ZERO);

    for behind in [false, true] {
        let ambient = Style {
            draw_content_behind: Some(behind),
            ..Style::default()
        };
        let mut effect = BackdropEffect::new(EffectId(0));
        effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
        effect.set_areas(vec![area]);
        effect.update(&mut reg, &env(&ambient, true)).unwrap();
        let list = effect
            .draw(&reg, &mut backend, &env(&ambient, true), &content())
            .unwrap();
        let first_is_content = matches!(list.ops()[0], DrawOp::FillRect { .. });
        assert_eq!(first_is_content, behind);
    }
}

#[test]
fn cross_window_areas_get_a_listener() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let same = produced_area(&mut reg, &mut backend, 0.0, Point::ZERO);
    let other = produced_area(&mut reg, &mut backend, 1.0, Point::ZERO);
    reg.get_mut(other).unwrap().place(
        Placement::at(Point::ZERO, Size::new(100.0, 100.0)).in_window(WindowId(9)),
    );

    let mut effect = BackdropEffect::new(EffectId(4));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.set_areas(vec![same, other]);
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(reg.get(same).unwrap().pre_draw_listeners().count(), 0);
    assert_eq!(
        reg.get(other).unwrap().pre_draw_listeners().collect::<Vec<_>>(),
        vec![EffectId(4)]
    );

    effect.set_areas(vec![same]);
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(reg.get(other).unwrap().pre_draw_listeners().count(), 0);
}

#[test]
fn detached_effect_refuses_to_draw_and_releases_layers() {
    let ambient = Style::default();
    let mut reg = AreaRegistry::new();
    let mut backend = Backend::with_kernels();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap();
    let layer = effect.content_layer().unwrap();

    effect.detach(&mut reg, &mut backend);
    assert!(backend.layer_state(layer).unwrap().released);
    assert_eq!(effect.cached_kernels(), 0);

    let err = effect
        .draw(&reg, &mut backend, &env(&ambient, true), &content())
        .unwrap_err();
    assert!(matches!(err, BackdropError::Detached(_)));
    assert!(effect.update(&mut reg, &env(&ambient, true)).is_err());
}

#[test]
fn auto_input_scale_follows_style() {
    let ambient = Style {
        input_scale: Some(crate::effect::input_scale::InputScale::Auto),
        ..Style::default()
    };
    let mut reg = AreaRegistry::new();
    let mut effect = BackdropEffect::new(EffectId(0));
    effect.place(Placement::at(Point::ZERO, Size::new(10.0, 10.0)));
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(effect.input_scale(), 0.3334);

    effect.set_style(radius(5.0)).unwrap();
    effect.update(&mut reg, &env(&ambient, true)).unwrap();
    assert_eq!(effect.input_scale(), 1.0);
    assert!(effect.dirty().contains(DirtyFields::INPUT_SCALE));
}
