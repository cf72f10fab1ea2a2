//! Backdrop blur compositing.
//!
//! Producer *areas* record their content into offscreen layers; consumer *effects* composite
//! the areas behind them into a scaled, blurred and tinted overlay. The engine emits
//! [`DisplayList`]s; a [`RenderBackend`] records layers and supplies blur kernels.
//!
//! - Build a [`Backdrop`], add areas and effects, place and style them
//! - Call [`Backdrop::update_effect`] after layout or configuration changes
//! - Record areas with [`Backdrop::begin_area_draw`] / [`Backdrop::finish_area_draw`]
//! - Draw each consumer with [`Backdrop::draw_effect`]
//!
//! [`CpuBackend`] is a reference backend rasterising display lists into RGBA8 frames.
#![forbid(unsafe_code)]

pub(crate) mod area;
pub(crate) mod effect;
pub(crate) mod foundation;
pub(crate) mod paint;
pub(crate) mod render;
pub(crate) mod scene;

pub use crate::foundation::core::{
    Affine, Color, IntSize, Point, Rect, RoundedRect, Size, Vec2, WindowId,
};
pub use crate::foundation::error::{BackdropError, BackdropResult};

pub use crate::area::region::{Area, AreaId, Placement};
pub use crate::area::registry::{AreaPredicate, AreaRegistry, resolve_visible_areas};
pub use crate::effect::compositor::{LayerBounds, compute_layer_bounds};
pub use crate::effect::dirty::{DirtyFields, DirtyTracker};
pub use crate::effect::easing::Easing;
pub use crate::effect::input_scale::{InputScale, scale_for};
pub use crate::effect::node::{BackdropEffect, EffectId};
pub use crate::effect::progressive::{
    Band, Bands, DEFAULT_BAND_STEP, LinearGradient, MAX_BANDS, Progressive, RadialGradient,
    generate_bands,
};
pub use crate::effect::strategy::{StrategyKind, select_strategy};
pub use crate::effect::style::{BlurredEdgeTreatment, ResolvedStyle, Style};
pub use crate::effect::tint::{Tint, boosted_alpha, scrim_tint};
pub use crate::paint::brush::{Brush, ColorStop};
pub use crate::paint::display_list::{BlendMode, DisplayList, DrawOp, LayerPaint};
pub use crate::render::backend::{
    InvalidationSink, Kernel, KernelProvider, KernelRequest, LayerId, LayerRecorder,
    LayerState, NoKernels, RenderBackend,
};
pub use crate::render::cpu::{CpuBackend, CpuBackendOpts, Frame};
pub use crate::render::pool::{PixmapPoolOpts, PixmapPoolStats};
pub use crate::scene::backdrop::{Backdrop, BackdropOpts};
pub use crate::scene::document::{AreaDef, EffectDef, FillDef, SceneDoc};
