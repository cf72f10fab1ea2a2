//! Reference CPU layer recorder and kernel provider.
//!
//! Display lists are rasterised immediately into premultiplied RGBA8 pixmaps. Geometry is
//! sampled at pixel centres; only translate and uniform scale transforms occur in display
//! lists, so clip rectangles stay axis-aligned in device space.

use std::collections::BTreeMap;

use kurbo::Shape;

use crate::{
    effect::tint::Tint,
    foundation::core::{Affine, Color, IntSize, Point, Rect, RoundedRect},
    foundation::error::{BackdropError, BackdropResult},
    foundation::math::{mul_div255_u8, pixel_noise},
    paint::brush::Brush,
    paint::display_list::{BlendMode, DisplayList, DrawOp, LayerPaint},
    render::backend::{Kernel, KernelProvider, KernelRequest, LayerId, LayerRecorder, LayerState},
    render::blur::{EdgeMode, blur_rgba8_premul, radius_for_sigma},
    render::composite::{PremulRgba8, blend, blend_in_place, over},
    render::pixmap::Pixmap,
    render::pool::{PixmapPool, PixmapPoolOpts, PixmapPoolStats},
};

/// Noise amplitude, in 8-bit steps, at a noise factor of 1.
const NOISE_AMPLITUDE: f32 = 64.0;

#[derive(Clone, Copy, Debug)]
pub struct CpuBackendOpts {
    /// Whether [`KernelProvider::create_kernel`] hands out blur kernels.
    pub kernels: bool,
    /// Color every rendered frame starts from; transparent when unset.
    pub clear: Option<Color>,
    pub pool: PixmapPoolOpts,
}

impl Default for CpuBackendOpts {
    fn default() -> Self {
        Self {
            kernels: true,
            clear: None,
            pool: PixmapPoolOpts::default(),
        }
    }
}

/// A rendered frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Straight-alpha copy of the pixel data, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

#[derive(Debug)]
struct CpuLayer {
    pixmap: Option<Pixmap>,
}

impl CpuLayer {
    fn size(&self) -> IntSize {
        self.pixmap.as_ref().map_or(IntSize::ZERO, Pixmap::size)
    }
}

#[derive(Debug)]
pub struct CpuBackend {
    opts: CpuBackendOpts,
    pool: PixmapPool,
    layers: BTreeMap<LayerId, CpuLayer>,
    next_layer: u32,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new(CpuBackendOpts::default())
    }
}

impl CpuBackend {
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self {
            opts,
            pool: PixmapPool::new(opts.pool),
            layers: BTreeMap::new(),
            next_layer: 0,
        }
    }

    /// Release every layer, as a graphics context does when it reclaims memory.
    pub fn reclaim_all(&mut self) {
        let ids: Vec<LayerId> = self.layers.keys().copied().collect();
        tracing::debug!(layers = ids.len(), "reclaim all layers");
        for id in ids {
            self.release_layer(id);
        }
    }

    /// Layers not yet released.
    pub fn live_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn pool_stats(&self) -> PixmapPoolStats {
        self.pool.stats()
    }

    /// Rasterise `list` into a new frame.
    #[tracing::instrument(level = "debug", skip(self, list), fields(ops = list.len()))]
    pub fn render(&mut self, list: &DisplayList, width: u32, height: u32) -> BackdropResult<Frame> {
        let mut target = self.pool.borrow(IntSize::new(width, height));
        if let Some(clear) = self.opts.clear {
            let px = clear.to_premul_rgba8();
            for d in target.data_mut().chunks_exact_mut(4) {
                d.copy_from_slice(&px);
            }
        }
        let pixmap = Rasterizer::new(&self.layers, &mut self.pool, target).run(list)?;
        Ok(Frame {
            width,
            height,
            data: pixmap.into_data(),
            premultiplied: true,
        })
    }
}

impl LayerRecorder for CpuBackend {
    fn create_layer(&mut self) -> LayerId {
        self.next_layer = self.next_layer.wrapping_add(1);
        let id = LayerId(self.next_layer);
        self.layers.insert(id, CpuLayer { pixmap: None });
        id
    }

    fn record_layer(
        &mut self,
        layer: LayerId,
        size: IntSize,
        list: &DisplayList,
    ) -> BackdropResult<()> {
        if !self.layers.contains_key(&layer) {
            return Err(BackdropError::render(format!(
                "{layer:?} is unknown or was released"
            )));
        }
        let target = self.pool.borrow(size);
        let pixmap = Rasterizer::new(&self.layers, &mut self.pool, target).run(list)?;
        if let Some(old) = self
            .layers
            .get_mut(&layer)
            .and_then(|l| l.pixmap.replace(pixmap))
        {
            self.pool.release(old);
        }
        Ok(())
    }

    fn layer_state(&self, layer: LayerId) -> Option<LayerState> {
        self.layers.get(&layer).map(|l| LayerState {
            size: l.size(),
            released: false,
        })
    }

    fn release_layer(&mut self, layer: LayerId) {
        if let Some(pixmap) = self.layers.remove(&layer).and_then(|l| l.pixmap) {
            self.pool.release(pixmap);
        }
    }
}

impl KernelProvider for CpuBackend {
    fn supports_kernels(&self) -> bool {
        self.opts.kernels
    }

    fn create_kernel(&mut self, req: &KernelRequest<'_>) -> Option<Kernel> {
        self.opts.kernels.then(|| Kernel::from_request(req))
    }
}

#[derive(Clone, Debug)]
struct DrawState {
    transform: Affine,
    /// Device-space clip bounds.
    clip: Rect,
    /// Rounded clips, each with its device-to-local transform.
    rounded: Vec<(Affine, RoundedRect)>,
}

impl DrawState {
    fn covers(&self, p: Point) -> bool {
        self.clip.contains(p) && self.rounded.iter().all(|(inv, rr)| rr.contains(*inv * p))
    }
}

struct Group {
    pixmap: Pixmap,
    blend: BlendMode,
}

struct Rasterizer<'a> {
    layers: &'a BTreeMap<LayerId, CpuLayer>,
    pool: &'a mut PixmapPool,
    base: Pixmap,
    groups: Vec<Group>,
    state: DrawState,
    saved: Vec<DrawState>,
}

impl<'a> Rasterizer<'a> {
    fn new(
        layers: &'a BTreeMap<LayerId, CpuLayer>,
        pool: &'a mut PixmapPool,
        base: Pixmap,
    ) -> Self {
        let bounds = Rect::from_origin_size(Point::ZERO, base.size().to_size());
        Self {
            layers,
            pool,
            base,
            groups: Vec::new(),
            state: DrawState {
                transform: Affine::IDENTITY,
                clip: bounds,
                rounded: Vec::new(),
            },
            saved: Vec::new(),
        }
    }

    fn target(&mut self) -> &mut Pixmap {
        match self.groups.last_mut() {
            Some(group) => &mut group.pixmap,
            None => &mut self.base,
        }
    }

    fn run(mut self, list: &DisplayList) -> BackdropResult<Pixmap> {
        for op in list.ops() {
            self.op(op)?;
        }
        if !self.groups.is_empty() {
            return Err(BackdropError::render("display list ends inside a group"));
        }
        Ok(self.base)
    }

    fn op(&mut self, op: &DrawOp) -> BackdropResult<()> {
        match op {
            DrawOp::Save => self.saved.push(self.state.clone()),
            DrawOp::Restore => match self.saved.pop() {
                Some(state) => self.state = state,
                None => tracing::trace!("restore without save, ignoring"),
            },
            DrawOp::Translate(v) => {
                self.state.transform = self.state.transform * Affine::translate(*v);
            }
            DrawOp::Scale(s) => {
                self.state.transform = self.state.transform * Affine::scale(*s);
            }
            DrawOp::ClipRect(rect) => {
                let device = self.state.transform.transform_rect_bbox(*rect);
                self.state.clip = self.state.clip.intersect(device);
            }
            DrawOp::ClipRoundedRect(rr) => {
                let device = self.state.transform.transform_rect_bbox(rr.rect());
                self.state.clip = self.state.clip.intersect(device);
                self.state
                    .rounded
                    .push((self.state.transform.inverse(), *rr));
            }
            DrawOp::FillRect { rect, brush, blend } => self.fill_rect(*rect, brush, *blend),
            DrawOp::DrawLayer { layer, dest, paint } => self.draw_layer(*layer, *dest, paint)?,
            DrawOp::BeginGroup { blend } => {
                let size = self.base.size();
                let pixmap = self.pool.borrow(size);
                self.groups.push(Group {
                    pixmap,
                    blend: *blend,
                });
            }
            DrawOp::EndGroup => {
                let Some(group) = self.groups.pop() else {
                    return Err(BackdropError::render("end of group without a matching begin"));
                };
                blend_in_place(self.target().data_mut(), group.pixmap.data(), group.blend, 1.0)?;
                self.pool.release(group.pixmap);
            }
        }
        Ok(())
    }

    /// Integer pixel span of a device rect, clipped to the target and the current clip.
    fn span(&self, device: Rect) -> Option<(u32, u32, u32, u32)> {
        let r = device.intersect(self.state.clip);
        let size = self.base.size();
        let x0 = r.x0.floor().max(0.0);
        let y0 = r.y0.floor().max(0.0);
        let x1 = r.x1.ceil().min(f64::from(size.width));
        let y1 = r.y1.ceil().min(f64::from(size.height));
        (x1 > x0 && y1 > y0).then(|| (x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn fill_rect(&mut self, rect: Rect, brush: &Brush, mode: BlendMode) {
        let device = self.state.transform.transform_rect_bbox(rect);
        let Some((x0, y0, x1, y1)) = self.span(device) else {
            return;
        };
        let inv = self.state.transform.inverse();
        let solid = brush.as_solid().map(Color::to_premul_rgba8);
        let state = self.state.clone();
        let target = self.target();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if !device.contains(p) || !state.covers(p) {
                    continue;
                }
                let src = solid.unwrap_or_else(|| brush.color_at(inv * p).to_premul_rgba8());
                let dst = target.pixel(x, y);
                target.set_pixel(x, y, blend(dst, src, mode, 1.0));
            }
        }
    }

    fn draw_layer(&mut self, layer: LayerId, dest: Rect, paint: &LayerPaint) -> BackdropResult<()> {
        let layers = self.layers;
        let Some(source) = layers
            .get(&layer)
            .and_then(|l| l.pixmap.as_ref())
        else {
            tracing::trace!(?layer, "layer missing or released, skipping playback");
            return Ok(());
        };
        let device = self.state.transform.transform_rect_bbox(dest);
        if source.size().is_empty() || device.width() <= 0.0 || device.height() <= 0.0 {
            return Ok(());
        }
        let Some((x0, y0, x1, y1)) = self.span(device) else {
            return Ok(());
        };

        let filtered;
        let (pixels, noise) = match &paint.kernel {
            Some(kernel) => {
                filtered = apply_kernel(source, kernel, device)?;
                (&filtered, kernel.noise_factor)
            }
            None => (source, 0.0),
        };
        let tints: &[Tint] = paint.kernel.as_ref().map_or(&[], |k| &k.tints);

        let inv = self.state.transform.inverse();
        let sx = f64::from(pixels.width()) / device.width();
        let sy = f64::from(pixels.height()) / device.height();
        let alpha = paint.alpha.clamp(0.0, 1.0);
        let state = self.state.clone();
        let target = self.target();
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if !device.contains(p) || !state.covers(p) {
                    continue;
                }
                let local = inv * p;
                let mut px = pixels.sample((p.x - device.x0) * sx, (p.y - device.y0) * sy, true);
                for tint in tints {
                    px = apply_tint(px, tint, local);
                }
                if noise > 0.0 {
                    px = add_noise(px, pixel_noise(x, y) * noise);
                }
                let mut coverage = alpha;
                if let Some(mask) = &paint.mask {
                    coverage *= mask.alpha_at(local);
                }
                let dst = target.pixel(x, y);
                target.set_pixel(x, y, over(dst, px, coverage));
            }
        }
        Ok(())
    }
}

/// Blur `source` for playback into `device`. The kernel's sigma is in device pixels.
fn apply_kernel(source: &Pixmap, kernel: &Kernel, device: Rect) -> BackdropResult<Pixmap> {
    let to_source = f64::from(source.width()) / device.width();
    let sigma = (f64::from(kernel.sigma) * to_source) as f32;
    let radius = if kernel.radius_px > 0.0 {
        radius_for_sigma(sigma)
    } else {
        0
    };
    let edge = if kernel.clamp_edges {
        EdgeMode::Clamp
    } else {
        EdgeMode::Decal
    };
    let data = blur_rgba8_premul(
        source.data(),
        source.width(),
        source.height(),
        radius,
        sigma,
        edge,
    )?;
    let mut out = Pixmap::new(source.size());
    out.data_mut().copy_from_slice(&data);
    Ok(out)
}

fn apply_tint(px: PremulRgba8, tint: &Tint, local: Point) -> PremulRgba8 {
    let (color, mode) = match tint {
        Tint::Color { color, blend } => (*color, *blend),
        Tint::Brush { brush, blend } => (brush.color_at(local), *blend),
    };
    blend(px, color.to_premul_rgba8(), mode, 1.0)
}

fn add_noise(px: PremulRgba8, amount: f32) -> PremulRgba8 {
    let delta = (amount * NOISE_AMPLITUDE).round() as i16;
    if delta == 0 || px[3] == 0 {
        return px;
    }
    // Scale by coverage so premultiplied channels never exceed alpha.
    let step = i16::from(mul_div255_u8(delta.unsigned_abs(), u16::from(px[3]))) * delta.signum();
    let a = i16::from(px[3]);
    let shift = |c: u8| (i16::from(c) + step).clamp(0, a) as u8;
    [shift(px[0]), shift(px[1]), shift(px[2]), px[3]]
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
