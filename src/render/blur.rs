use crate::foundation::error::{BackdropError, BackdropResult};

/// What separable blur passes read past the buffer edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeMode {
    /// Repeat the edge pixel.
    Clamp,
    /// Transparent black.
    Decal,
}

/// Gaussian blur of a premultiplied RGBA8 buffer.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
    edge: EdgeMode,
) -> BackdropResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BackdropError::render("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(BackdropError::render(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let pass = Pass {
        width,
        height,
        kernel: &kernel,
        edge,
    };
    pass.run(src, &mut tmp, Axis::Horizontal);
    pass.run(&tmp, &mut out, Axis::Vertical);
    Ok(out)
}

/// Kernel radius in pixels covering three standard deviations.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil().min(1024.0) as u32
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> BackdropResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(BackdropError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(BackdropError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift goes to the centre tap so flat regions stay flat.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

struct Pass<'a> {
    width: u32,
    height: u32,
    kernel: &'a [u32],
    edge: EdgeMode,
}

impl Pass<'_> {
    fn run(&self, src: &[u8], dst: &mut [u8], axis: Axis) {
        let radius = (self.kernel.len() / 2) as i32;
        let w = self.width as i32;
        let h = self.height as i32;
        let len = match axis {
            Axis::Horizontal => w,
            Axis::Vertical => h,
        };
        for y in 0..h {
            for x in 0..w {
                let along = match axis {
                    Axis::Horizontal => x,
                    Axis::Vertical => y,
                };
                let mut acc = [0u64; 4];
                for (ki, &kw) in self.kernel.iter().enumerate() {
                    let mut s = along + ki as i32 - radius;
                    if s < 0 || s >= len {
                        match self.edge {
                            EdgeMode::Clamp => s = s.clamp(0, len - 1),
                            EdgeMode::Decal => continue,
                        }
                    }
                    let (sx, sy) = match axis {
                        Axis::Horizontal => (s, y),
                        Axis::Vertical => (x, s),
                    };
                    let idx = ((sy * w + sx) as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                let out_idx = ((y * w + x) as usize) * 4;
                for c in 0..4 {
                    dst[out_idx + c] = q16_to_u8(acc[c]);
                }
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
