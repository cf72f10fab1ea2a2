use crate::{
    foundation::core::{Rect, RoundedRect, Vec2},
    paint::brush::Brush,
    render::backend::{Kernel, LayerId},
};

/// Porter-Duff and separable blend modes understood by layer recorders.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    SrcOver,
    Src,
    DstIn,
    Multiply,
}

/// How a layer is played back: optional blur kernel, opacity and alpha mask.
///
/// The mask is evaluated in the coordinate space active when the layer is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerPaint {
    pub kernel: Option<Kernel>,
    pub alpha: f32,
    pub mask: Option<Brush>,
}

impl Default for LayerPaint {
    fn default() -> Self {
        Self {
            kernel: None,
            alpha: 1.0,
            mask: None,
        }
    }
}

/// A single recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate(Vec2),
    Scale(f64),
    ClipRect(Rect),
    ClipRoundedRect(RoundedRect),
    FillRect {
        rect: Rect,
        brush: Brush,
        blend: BlendMode,
    },
    /// Play back `layer` stretched into `dest`.
    DrawLayer {
        layer: LayerId,
        dest: Rect,
        paint: LayerPaint,
    },
    /// Start an offscreen group; everything until the matching [`DrawOp::EndGroup`] is
    /// drawn into a transparent buffer and composited with `blend` afterwards.
    BeginGroup {
        blend: BlendMode,
    },
    EndGroup,
}

/// Recorded visual content, played back by a [`crate::LayerRecorder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn append(&mut self, other: &DisplayList) {
        self.ops.extend(other.ops.iter().cloned());
    }

    pub fn save(&mut self) {
        self.push(DrawOp::Save);
    }

    pub fn restore(&mut self) {
        self.push(DrawOp::Restore);
    }

    pub fn translate(&mut self, by: Vec2) {
        if by != Vec2::ZERO {
            self.push(DrawOp::Translate(by));
        }
    }

    pub fn scale(&mut self, factor: f64) {
        if factor != 1.0 {
            self.push(DrawOp::Scale(factor));
        }
    }

    pub fn clip_rect(&mut self, rect: Rect) {
        self.push(DrawOp::ClipRect(rect));
    }

    pub fn clip_rounded_rect(&mut self, rect: RoundedRect) {
        self.push(DrawOp::ClipRoundedRect(rect));
    }

    pub fn fill_rect(&mut self, rect: Rect, brush: Brush, blend: BlendMode) {
        self.push(DrawOp::FillRect { rect, brush, blend });
    }

    pub fn draw_layer(&mut self, layer: LayerId, dest: Rect, paint: LayerPaint) {
        self.push(DrawOp::DrawLayer { layer, dest, paint });
    }

    /// Run `f` between a save/restore pair.
    pub fn with_save(&mut self, f: impl FnOnce(&mut Self)) {
        self.save();
        f(self);
        self.restore();
    }

    /// Run `f` inside an offscreen group composited with `blend`.
    pub fn with_group(&mut self, blend: BlendMode, f: impl FnOnce(&mut Self)) {
        self.push(DrawOp::BeginGroup { blend });
        f(self);
        self.push(DrawOp::EndGroup);
    }

    /// Layers referenced by this list, in op order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::DrawLayer { layer, .. } => Some(*layer),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/display_list.rs"]
mod tests;
