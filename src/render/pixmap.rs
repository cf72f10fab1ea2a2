use crate::{foundation::core::IntSize, render::composite::PremulRgba8};

/// Premultiplied RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixmap {
    size: IntSize,
    data: Vec<u8>,
}

impl Pixmap {
    pub fn new(size: IntSize) -> Self {
        Self {
            size,
            data: vec![0; size.pixel_count() * 4],
        }
    }

    pub fn size(&self) -> IntSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.size.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: PremulRgba8) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&px);
    }

    /// Bilinear sample at pixel-space coordinates (pixel centres at `+0.5`).
    ///
    /// Outside the buffer samples clamp to the edge when `clamp` is set, otherwise they are
    /// transparent.
    pub fn sample(&self, x: f64, y: f64, clamp: bool) -> PremulRgba8 {
        if self.size.is_empty() {
            return [0; 4];
        }
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = (fx - x0) as f32;
        let ty = (fy - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let taps = [
            (self.tap(x0, y0, clamp), (1.0 - tx) * (1.0 - ty)),
            (self.tap(x0 + 1, y0, clamp), tx * (1.0 - ty)),
            (self.tap(x0, y0 + 1, clamp), (1.0 - tx) * ty),
            (self.tap(x0 + 1, y0 + 1, clamp), tx * ty),
        ];
        let mut out = [0f32; 4];
        for (px, w) in taps {
            for c in 0..4 {
                out[c] += f32::from(px[c]) * w;
            }
        }
        out.map(|v| v.round().clamp(0.0, 255.0) as u8)
    }

    fn tap(&self, x: i64, y: i64, clamp: bool) -> PremulRgba8 {
        let w = i64::from(self.size.width);
        let h = i64::from(self.size.height);
        if clamp {
            return self.pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32);
        }
        if x < 0 || y < 0 || x >= w || y >= h {
            return [0; 4];
        }
        self.pixel(x as u32, y as u32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixmap.rs"]
mod tests;
