//! Content-layer composition.
//!
//! A consumer captures everything behind it into one offscreen layer: the layer covers the
//! consumer's bounds plus the blur bleed, is optionally downscaled by the input scale, and
//! receives every visible producer's content layer in paint order. The layer is then played
//! back under the consumer, scaled back up to cover its destination.

use crate::{
    area::region::Area,
    effect::style::BlurredEdgeTreatment,
    foundation::core::{Color, IntSize, Point, Rect, RoundedRect, Size, Vec2},
    foundation::error::{BackdropError, BackdropResult},
    paint::brush::Brush,
    paint::display_list::{BlendMode, DisplayList, LayerPaint},
    render::backend::{LayerId, LayerRecorder},
};

/// Geometry of a consumer's content layer in consumer-local units.
///
/// `offset` is where the consumer's origin sits inside the layer; it is non-zero when the
/// layer is inflated to keep blur samples near the edges.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayerBounds {
    pub size: Size,
    pub offset: Vec2,
}

/// Layer bounds for a consumer of `size`, inflated by the pixel blur radius on every side
/// while blurring is enabled.
pub fn compute_layer_bounds(size: Size, blur_radius_px: f64, blur_enabled: bool) -> LayerBounds {
    if !blur_enabled || !blur_radius_px.is_finite() || blur_radius_px <= 0.0 {
        return LayerBounds {
            size,
            offset: Vec2::ZERO,
        };
    }
    let r = blur_radius_px;
    LayerBounds {
        size: Size::new(size.width + 2.0 * r, size.height + 2.0 * r),
        offset: Vec2::new(r, r),
    }
}

/// Pixel size of the content layer, or `None` when there is nothing to draw.
pub fn layer_pixel_size(bounds: LayerBounds, scale: f32) -> Option<IntSize> {
    let w = (bounds.size.width * f64::from(scale)).ceil();
    let h = (bounds.size.height * f64::from(scale)).ceil();
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let size = IntSize::ceil_from(Size::new(w, h));
    (!size.is_empty()).then_some(size)
}

/// One input of a content layer.
#[derive(Clone, Copy, Debug)]
pub enum ContentSource<'a> {
    /// A producer area, composited at its screen position.
    Area(&'a Area),
    /// The consumer's own recorded content.
    Own {
        layer: LayerId,
        position: Point,
        size: Size,
    },
}

/// Inputs of [`build_content_layer`].
#[derive(Clone, Debug)]
pub struct ContentRequest<'a> {
    pub bounds: LayerBounds,
    /// Consumer position in screen space.
    pub position: Point,
    pub scale: f32,
    pub background: Option<Color>,
    /// Sources in paint order.
    pub sources: &'a [ContentSource<'a>],
}

/// A recorded content layer and its pixel size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentLayer {
    pub id: LayerId,
    pub size: IntSize,
}

/// Record the consumer's content layer.
///
/// `reuse` is the layer recorded on a previous frame; it is recorded into again while the
/// recorder still holds it. Returns `Ok(None)` when the layer would be empty.
///
/// Fails with [`BackdropError::Graph`] if a source area is being recorded: its content
/// contains the consumer itself.
pub fn build_content_layer<R: LayerRecorder + ?Sized>(
    recorder: &mut R,
    reuse: Option<LayerId>,
    req: &ContentRequest<'_>,
) -> BackdropResult<Option<ContentLayer>> {
    let Some(size) = layer_pixel_size(req.bounds, req.scale) else {
        tracing::trace!(bounds = ?req.bounds, scale = req.scale, "empty content layer, skipping");
        return Ok(None);
    };

    for source in req.sources {
        if let ContentSource::Area(area) = source
            && area.is_recording()
        {
            return Err(BackdropError::graph(format!(
                "area {:?} is composited while its own content is being recorded",
                area.id()
            )));
        }
    }

    let mut list = DisplayList::new();
    if let Some(color) = req.background {
        list.fill_rect(
            Rect::from_origin_size(Point::ZERO, size.to_size()),
            Brush::solid(color),
            BlendMode::Src,
        );
    }
    list.scale(f64::from(req.scale));

    let to_layer = req.bounds.offset - req.position.to_vec2();
    for source in req.sources {
        let Some((layer, position, src_size)) = playable(recorder, source) else {
            continue;
        };
        list.with_save(|list| {
            list.translate(to_layer);
            list.translate(position.to_vec2());
            list.draw_layer(
                layer,
                Rect::from_origin_size(Point::ZERO, src_size),
                LayerPaint::default(),
            );
        });
    }

    let id = match reuse {
        Some(layer) if recorder.is_reusable(layer) => layer,
        _ => recorder.create_layer(),
    };
    recorder.record_layer(id, size, &list)?;
    Ok(Some(ContentLayer { id, size }))
}

fn playable<R: LayerRecorder + ?Sized>(
    recorder: &R,
    source: &ContentSource<'_>,
) -> Option<(LayerId, Point, Size)> {
    let (layer, position, size) = match *source {
        ContentSource::Area(area) => {
            let (Some(layer), Some(position)) = (area.content_layer(), area.position()) else {
                tracing::trace!(area = ?area.id(), "area has no content yet, skipping");
                return None;
            };
            (layer, position, area.size())
        }
        ContentSource::Own {
            layer,
            position,
            size,
        } => (layer, position, size),
    };
    if !recorder
        .layer_state(layer)
        .is_some_and(|state| state.is_drawable())
        || size.width <= 0.0
        || size.height <= 0.0
    {
        tracing::trace!(?layer, "source layer released or empty, skipping");
        return None;
    }
    Some((layer, position, size))
}

/// Clip applied when a content layer is drawn under its consumer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Clip {
    Rect(Rect),
    RoundedRect(RoundedRect),
}

impl Clip {
    /// Clip matching `edge` for a consumer of `size` at the local origin.
    pub fn for_edge(edge: BlurredEdgeTreatment, size: Size) -> Option<Self> {
        let rect = Rect::from_origin_size(Point::ZERO, size);
        match edge {
            BlurredEdgeTreatment::Unbounded => None,
            BlurredEdgeTreatment::Rectangle => Some(Self::Rect(rect)),
            BlurredEdgeTreatment::RoundedRect { corner_radius } => {
                Some(Self::RoundedRect(RoundedRect::from_rect(rect, corner_radius)))
            }
        }
    }
}

/// Uniform factor that makes `scaled` cover `real` on both axes.
pub fn cover_scale(real: Size, scaled: Size) -> f64 {
    if scaled.width <= 0.0 || scaled.height <= 0.0 {
        return 1.0;
    }
    (real.width / scaled.width).max(real.height / scaled.height)
}

/// Play `layer` back in consumer-local space.
///
/// The layer is scaled to cover `real_size` (the unscaled layer bounds) and placed so the
/// consumer origin lands at `target_offset` inside it.
pub fn draw_scaled_content(
    list: &mut DisplayList,
    layer: ContentLayer,
    target_offset: Vec2,
    real_size: Size,
    clip: Option<Clip>,
    paint: LayerPaint,
) {
    let scaled = layer.size.to_size();
    let scale = cover_scale(real_size, scaled);
    let dest = Rect::from_origin_size(
        (-target_offset).to_point(),
        Size::new(scaled.width * scale, scaled.height * scale),
    );
    list.with_save(|list| {
        match clip {
            Some(Clip::Rect(rect)) => list.clip_rect(rect),
            Some(Clip::RoundedRect(rect)) => list.clip_rounded_rect(rect),
            None => {}
        }
        list.draw_layer(layer.id, dest, paint);
    });
}

#[cfg(test)]
#[path = "../../tests/unit/effect/compositor.rs"]
mod tests;
