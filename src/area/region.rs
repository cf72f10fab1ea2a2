use std::collections::BTreeSet;

use crate::{
    effect::node::EffectId,
    foundation::core::{IntSize, Point, Rect, Size, WindowId},
    render::backend::{LayerId, LayerRecorder},
};

/// Handle of a producer area.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct AreaId(pub u32);

/// Where the layout source placed a region this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Screen-space position; `None` until the first layout pass resolves it.
    pub position: Option<Point>,
    pub size: Size,
    pub window: Option<WindowId>,
}

impl Placement {
    pub fn at(position: Point, size: Size) -> Self {
        Self {
            position: Some(position),
            size,
            window: None,
        }
    }

    pub fn in_window(self, window: WindowId) -> Self {
        Self {
            window: Some(window),
            ..self
        }
    }
}

/// A producer region: z-ordered content that consumers composite behind themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct Area {
    id: AreaId,
    position: Option<Point>,
    size: Size,
    z_index: f32,
    window: Option<WindowId>,
    content_layer: Option<LayerId>,
    recording: bool,
    pre_draw_listeners: BTreeSet<EffectId>,
}

impl Area {
    pub fn new(id: AreaId, z_index: f32) -> Self {
        Self {
            id,
            position: None,
            size: Size::ZERO,
            z_index,
            window: None,
            content_layer: None,
            recording: false,
            pre_draw_listeners: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn z_index(&self) -> f32 {
        self.z_index
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    /// Screen-space bounds, once positioned.
    pub fn bounds(&self) -> Option<Rect> {
        self.position.map(|p| Rect::from_origin_size(p, self.size))
    }

    pub fn content_layer(&self) -> Option<LayerId> {
        self.content_layer
    }

    /// True while the area's own content is being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn pre_draw_listeners(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.pre_draw_listeners.iter().copied()
    }

    pub(crate) fn place(&mut self, placement: Placement) {
        self.position = placement.position;
        self.size = placement.size;
        self.window = placement.window;
    }

    pub(crate) fn set_z_index(&mut self, z: f32) {
        self.z_index = z;
    }

    pub(crate) fn add_listener(&mut self, effect: EffectId) -> bool {
        self.pre_draw_listeners.insert(effect)
    }

    pub(crate) fn remove_listener(&mut self, effect: EffectId) -> bool {
        self.pre_draw_listeners.remove(&effect)
    }

    pub(crate) fn begin_recording(&mut self) {
        self.recording = true;
    }

    pub(crate) fn end_recording(&mut self) {
        self.recording = false;
    }

    /// Content layer to record into: the cached one while the recorder still holds it,
    /// otherwise a fresh layer.
    pub(crate) fn ensure_content_layer<R: LayerRecorder + ?Sized>(
        &mut self,
        recorder: &mut R,
    ) -> LayerId {
        match self.content_layer {
            Some(layer) if recorder.is_reusable(layer) => layer,
            stale => {
                let layer = recorder.create_layer();
                tracing::debug!(area = ?self.id, ?stale, ?layer, "create area content layer");
                self.content_layer = Some(layer);
                layer
            }
        }
    }

    /// Pixel size the content layer is recorded at.
    pub fn content_size(&self) -> IntSize {
        IntSize::ceil_from(self.size)
    }

    pub(crate) fn release_content<R: LayerRecorder + ?Sized>(&mut self, recorder: &mut R) {
        if let Some(layer) = self.content_layer.take() {
            recorder.release_layer(layer);
        }
    }
}
