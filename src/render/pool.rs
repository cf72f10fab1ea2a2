use std::collections::HashMap;

use crate::{foundation::core::IntSize, render::pixmap::Pixmap};

/// Pool configuration for recycled pixmaps.
#[derive(Debug, Clone, Copy)]
pub struct PixmapPoolOpts {
    /// Maximum bytes retained across all buckets.
    pub max_pool_bytes: usize,
    /// Maximum number of retained pixmaps per size bucket.
    pub max_pixmaps_per_bucket: usize,
}

impl Default for PixmapPoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_pixmaps_per_bucket: 8,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PixmapPoolStats {
    pub retained_pixmaps: usize,
    pub retained_bytes: usize,
    pub alloc_pixmaps: u64,
    pub alloc_bytes: u64,
    pub dropped_on_release: u64,
}

fn byte_len(size: IntSize) -> usize {
    size.pixel_count().saturating_mul(4)
}

/// Bounded allocator for layer and scratch pixmaps, keyed by pixel size.
///
/// Borrowed pixmaps are always cleared to transparent.
#[derive(Debug)]
pub struct PixmapPool {
    opts: PixmapPoolOpts,
    stats: PixmapPoolStats,
    buckets: HashMap<IntSize, Vec<Pixmap>>,
}

impl Default for PixmapPool {
    fn default() -> Self {
        Self::new(PixmapPoolOpts::default())
    }
}

impl PixmapPool {
    pub fn new(opts: PixmapPoolOpts) -> Self {
        Self {
            opts,
            stats: PixmapPoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub fn stats(&self) -> PixmapPoolStats {
        self.stats.clone()
    }

    pub fn borrow(&mut self, size: IntSize) -> Pixmap {
        if let Some(mut p) = self.buckets.get_mut(&size).and_then(Vec::pop) {
            self.stats.retained_pixmaps = self.stats.retained_pixmaps.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(p.byte_len());
            p.clear();
            return p;
        }

        self.stats.alloc_pixmaps = self.stats.alloc_pixmaps.saturating_add(1);
        self.stats.alloc_bytes = self.stats.alloc_bytes.saturating_add(byte_len(size) as u64);
        Pixmap::new(size)
    }

    pub fn release(&mut self, pixmap: Pixmap) {
        let bytes = pixmap.byte_len();
        if self.opts.max_pool_bytes == 0
            || self.opts.max_pixmaps_per_bucket == 0
            || self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes
        {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(pixmap.size()).or_default();
        if bucket.len() >= self.opts.max_pixmaps_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_pixmaps = self.stats.retained_pixmaps.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pool.rs"]
mod tests;
