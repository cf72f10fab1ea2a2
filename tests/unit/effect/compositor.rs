use std::collections::BTreeMap;

use super::*;
use crate::{
    area::region::{AreaId, Placement},
    paint::display_list::DrawOp,
    render::backend::LayerState,
};

#[derive(Default)]
struct Recorder {
    next: u32,
    layers: BTreeMap<LayerId, LayerState>,
    recorded: Vec<(LayerId, IntSize, DisplayList)>,
}

impl Recorder {
    fn with_layer(&mut self, size: IntSize) -> LayerId {
        let id = self.create_layer();
        self.layers.insert(
            id,
            LayerState {
                size,
                released: false,
            },
        );
        id
    }
}

impl LayerRecorder for Recorder {
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

    fn record_layer(
        &mut self,
        layer: LayerId,
        size: IntSize,
        list: &DisplayList,
    ) -> BackdropResult<()> {
        if let Some(state) = self.layers.get_mut(&layer) {
            state.size = size;
        }
        self.recorded.push((layer, size, list.clone()));
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

fn area_with_content(rec: &mut Recorder, id: u32, at: Point, size: Size) -> Area {
    let mut area = Area::new(AreaId(id), id as f32);
    area.place(Placement::at(at, size));
    area.ensure_content_layer(rec);
    let layer = area.content_layer().unwrap();
    rec.record_layer(layer, IntSize::ceil_from(size), &DisplayList::new())
        .unwrap();
    area
}

#[test]
fn bounds_inflate_by_radius_on_each_side() {
    let b = compute_layer_bounds(Size::new(100.0, 100.0), 10.0, true);
    assert_eq!(b.size, Size::new(120.0, 120.0));
    assert_eq!(b.offset, Vec2::new(10.0, 10.0));
}

#[test]
fn bounds_not_inflated_without_blur() {
    let size = Size::new(100.0, 50.0);
    assert_eq!(compute_layer_bounds(size, 10.0, false).size, size);
    assert_eq!(compute_layer_bounds(size, 0.0, true).offset, Vec2::ZERO);
}

#[test]
fn pixel_size_rounds_up_and_rejects_empty() {
    let b = compute_layer_bounds(Size::new(100.0, 100.0), 10.0, true);
    assert_eq!(layer_pixel_size(b, 1.0), Some(IntSize::new(120, 120)));
    assert_eq!(layer_pixel_size(b, 0.3334), Some(IntSize::new(41, 41)));

    let flat = LayerBounds {
        size: Size::new(100.0, 0.0),
        offset: Vec2::ZERO,
    };
    assert_eq!(layer_pixel_size(flat, 1.0), None);
}

#[test]
fn content_layer_translates_sources_into_layer_space() {
    let mut rec = Recorder::default();
    let area = area_with_content(&mut rec, 0, Point::ZERO, Size::new(100.0, 100.0));
    let sources = [ContentSource::Area(&area)];
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(100.0, 100.0), 10.0, true),
        position: Point::new(0.0, 0.0),
        scale: 0.5,
        background: Some(Color::WHITE),
        sources: &sources,
    };

    let layer = build_content_layer(&mut rec, None, &req).unwrap().unwrap();
    assert_eq!(layer.size, IntSize::new(60, 60));

    let (id, size, list) = rec.recorded.last().unwrap();
    assert_eq!((*id, *size), (layer.id, layer.size));
    let ops = list.ops();
    assert!(matches!(ops[0], DrawOp::FillRect { blend: BlendMode::Src, .. }));
    assert_eq!(ops[1], DrawOp::Scale(0.5));
    assert_eq!(ops[2], DrawOp::Save);
    assert_eq!(ops[3], DrawOp::Translate(Vec2::new(10.0, 10.0)));
    assert!(matches!(
        ops[4],
        DrawOp::DrawLayer { dest, .. } if dest == Rect::new(0.0, 0.0, 100.0, 100.0)
    ));
    assert_eq!(ops[5], DrawOp::Restore);
}

#[test]
fn offsets_are_relative_to_consumer() {
    let mut rec = Recorder::default();
    let area = area_with_content(&mut rec, 0, Point::new(30.0, 40.0), Size::new(10.0, 10.0));
    let sources = [ContentSource::Area(&area)];
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(50.0, 50.0), 0.0, true),
        position: Point::new(20.0, 20.0),
        scale: 1.0,
        background: None,
        sources: &sources,
    };
    build_content_layer(&mut rec, None, &req).unwrap().unwrap();

    let list = &rec.recorded.last().unwrap().2;
    assert_eq!(list.ops()[1], DrawOp::Translate(Vec2::new(-20.0, -20.0)));
    assert_eq!(list.ops()[2], DrawOp::Translate(Vec2::new(30.0, 40.0)));
}

#[test]
fn released_or_missing_sources_are_skipped() {
    let mut rec = Recorder::default();
    let released = area_with_content(&mut rec, 0, Point::ZERO, Size::new(10.0, 10.0));
    rec.release_layer(released.content_layer().unwrap());
    let mut unplaced = Area::new(AreaId(1), 1.0);
    unplaced.place(Placement {
        position: None,
        size: Size::new(10.0, 10.0),
        window: None,
    });

    let sources = [ContentSource::Area(&released), ContentSource::Area(&unplaced)];
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(10.0, 10.0), 0.0, true),
        position: Point::ZERO,
        scale: 1.0,
        background: None,
        sources: &sources,
    };
    build_content_layer(&mut rec, None, &req).unwrap().unwrap();
    assert_eq!(rec.recorded.last().unwrap().2.layers().count(), 0);
}

#[test]
fn recording_source_is_a_graph_error() {
    let mut rec = Recorder::default();
    let mut area = area_with_content(&mut rec, 0, Point::ZERO, Size::new(10.0, 10.0));
    area.begin_recording();
    let sources = [ContentSource::Area(&area)];
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(10.0, 10.0), 0.0, true),
        position: Point::ZERO,
        scale: 1.0,
        background: None,
        sources: &sources,
    };
    let err = build_content_layer(&mut rec, None, &req).unwrap_err();
    assert!(matches!(err, BackdropError::Graph(_)));
    assert!(err.is_fatal());
}

#[test]
fn empty_layer_is_skipped_without_allocating() {
    let mut rec = Recorder::default();
    let req = ContentRequest {
        bounds: LayerBounds::default(),
        position: Point::ZERO,
        scale: 1.0,
        background: None,
        sources: &[],
    };
    assert_eq!(build_content_layer(&mut rec, None, &req).unwrap(), None);
    assert_eq!(rec.next, 0);
}

#[test]
fn previous_layer_is_reused_until_released() {
    let mut rec = Recorder::default();
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(10.0, 10.0), 0.0, true),
        position: Point::ZERO,
        scale: 1.0,
        background: None,
        sources: &[],
    };
    let first = build_content_layer(&mut rec, None, &req).unwrap().unwrap();
    let again = build_content_layer(&mut rec, Some(first.id), &req).unwrap().unwrap();
    assert_eq!(again.id, first.id);

    rec.release_layer(first.id);
    let fresh = build_content_layer(&mut rec, Some(first.id), &req).unwrap().unwrap();
    assert_ne!(fresh.id, first.id);
}

#[test]
fn own_content_is_a_source() {
    let mut rec = Recorder::default();
    let own = rec.with_layer(IntSize::new(10, 10));
    let sources = [ContentSource::Own {
        layer: own,
        position: Point::new(5.0, 5.0),
        size: Size::new(10.0, 10.0),
    }];
    let req = ContentRequest {
        bounds: compute_layer_bounds(Size::new(10.0, 10.0), 2.0, true),
        position: Point::new(5.0, 5.0),
        scale: 1.0,
        background: None,
        sources: &sources,
    };
    build_content_layer(&mut rec, None, &req).unwrap().unwrap();
    let list = &rec.recorded.last().unwrap().2;
    assert_eq!(list.layers().collect::<Vec<_>>(), vec![own]);
}

#[test]
fn cover_scale_uses_the_larger_ratio() {
    assert_eq!(cover_scale(Size::new(120.0, 60.0), Size::new(40.0, 30.0)), 3.0);
    assert_eq!(cover_scale(Size::new(10.0, 10.0), Size::ZERO), 1.0);
}

#[test]
fn scaled_content_covers_the_bounds() {
    let layer = ContentLayer {
        id: LayerId(7),
        size: IntSize::new(40, 40),
    };
    let mut list = DisplayList::new();
    draw_scaled_content(
        &mut list,
        layer,
        Vec2::new(10.0, 10.0),
        Size::new(120.0, 120.0),
        Clip::for_edge(BlurredEdgeTreatment::Rectangle, Size::new(100.0, 100.0)),
        LayerPaint::default(),
    );
    assert_eq!(
        list.ops(),
        &[
            DrawOp::Save,
            DrawOp::ClipRect(Rect::new(0.0, 0.0, 100.0, 100.0)),
            DrawOp::DrawLayer {
                layer: LayerId(7),
                dest: Rect::new(-10.0, -10.0, 110.0, 110.0),
                paint: LayerPaint::default(),
            },
            DrawOp::Restore,
        ]
    );
}

#[test]
fn clip_follows_edge_treatment() {
    let size = Size::new(10.0, 10.0);
    assert_eq!(Clip::for_edge(BlurredEdgeTreatment::Unbounded, size), None);
    assert!(matches!(
        Clip::for_edge(BlurredEdgeTreatment::RoundedRect { corner_radius: 4.0 }, size),
        Some(Clip::RoundedRect(_))
    ));
}
