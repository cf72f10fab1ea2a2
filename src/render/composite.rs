use crate::{
    foundation::error::{BackdropError, BackdropResult},
    foundation::math::mul_div255_u8,
    paint::display_list::BlendMode,
};

pub type PremulRgba8 = [u8; 4];

fn opacity_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

fn scale(px: PremulRgba8, op: u16) -> PremulRgba8 {
    [
        mul_div255_u8(u16::from(px[0]), op),
        mul_div255_u8(u16::from(px[1]), op),
        mul_div255_u8(u16::from(px[2]), op),
        mul_div255_u8(u16::from(px[3]), op),
    ]
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = opacity_u16(opacity);
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Replace `dst` with `src` where `coverage` is full, interpolating elsewhere.
pub fn source(dst: PremulRgba8, src: PremulRgba8, coverage: f32) -> PremulRgba8 {
    let t = opacity_u16(coverage);
    let it = 255 - t;
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = mul_div255_u8(u16::from(src[i]), t)
            .saturating_add(mul_div255_u8(u16::from(dst[i]), it));
    }
    out
}

/// Keep `dst` where `src` is opaque: `dst * src.alpha`, blended by `coverage`.
///
/// Outside the coverage the destination is left untouched.
pub fn dst_in(dst: PremulRgba8, src: PremulRgba8, coverage: f32) -> PremulRgba8 {
    let c = opacity_u16(coverage);
    // Effective mask alpha: src alpha inside coverage, 1 outside it.
    let keep = mul_div255_u8(u16::from(src[3]), c).saturating_add((255 - c) as u8);
    scale(dst, u16::from(keep))
}

/// Separable multiply: `src * dst + src * (1 - da) + dst * (1 - sa)`.
pub fn multiply(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_u16(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let src = scale(src, op);
    let sa = u16::from(src[3]);
    let da = u16::from(dst[3]);
    let mut out = [0u8; 4];
    for i in 0..3 {
        let s = u16::from(src[i]);
        let d = u16::from(dst[i]);
        let v = u16::from(mul_div255_u8(s, d))
            + u16::from(mul_div255_u8(s, 255 - da))
            + u16::from(mul_div255_u8(d, 255 - sa));
        out[i] = v.min(255) as u8;
    }
    out[3] = src[3].saturating_add(mul_div255_u8(da, 255 - sa));
    out
}

/// Apply `mode` for one pixel. `coverage` is the geometric coverage times any paint alpha.
pub fn blend(dst: PremulRgba8, src: PremulRgba8, mode: BlendMode, coverage: f32) -> PremulRgba8 {
    match mode {
        BlendMode::SrcOver => over(dst, src, coverage),
        BlendMode::Src => source(dst, src, coverage),
        BlendMode::DstIn => dst_in(dst, src, coverage),
        BlendMode::Multiply => multiply(dst, src, coverage),
    }
}

/// Composite a whole buffer onto another of the same size.
pub fn blend_in_place(
    dst: &mut [u8],
    src: &[u8],
    mode: BlendMode,
    opacity: f32,
) -> BackdropResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BackdropError::render(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = blend([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], mode, opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
