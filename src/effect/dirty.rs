//! Dirty-field tracking for consumers.
//!
//! Each mutable configuration field owns one bit. Writes that change a value set the bit;
//! the tracker is drained once per completed draw. Groups are plain unions of bits and are
//! tested with [`DirtyTracker::any`].

use std::ops::AddAssign;

use bitflags::bitflags;

bitflags! {
    /// Named dirty bits, one per mutable field.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DirtyFields: u32 {
        const BLUR_RADIUS = 1 << 0;
        const NOISE_FACTOR = 1 << 1;
        const MASK = 1 << 2;
        const BACKGROUND_COLOR = 1 << 3;
        const TINTS = 1 << 4;
        const FALLBACK_TINT = 1 << 5;
        const ALPHA = 1 << 6;
        const PROGRESSIVE = 1 << 7;
        const EDGE_TREATMENT = 1 << 8;
        const INPUT_SCALE = 1 << 9;
        const DRAW_CONTENT_BEHIND = 1 << 10;
        const BLUR_ENABLED = 1 << 11;
        const AREAS = 1 << 12;
        const AREA_OFFSETS = 1 << 13;
        const POSITION = 1 << 14;
        const SIZE = 1 << 15;
        const LAYER_SIZE = 1 << 16;
        const LAYER_OFFSET = 1 << 17;
        const STRATEGY = 1 << 18;
        const AREA_CONTENT = 1 << 19;

        /// Fields baked into a blur kernel; a cached kernel is stale when any is dirty.
        const KERNEL_AFFECTING = Self::BLUR_RADIUS.bits()
            | Self::NOISE_FACTOR.bits()
            | Self::MASK.bits()
            | Self::TINTS.bits()
            | Self::LAYER_SIZE.bits()
            | Self::LAYER_OFFSET.bits()
            | Self::INPUT_SCALE.bits()
            | Self::EDGE_TREATMENT.bits()
            | Self::PROGRESSIVE.bits();

        /// Fields that change the content layer's geometry or source set.
        const LAYER_AFFECTING = Self::AREAS.bits()
            | Self::AREA_OFFSETS.bits()
            | Self::POSITION.bits()
            | Self::SIZE.bits()
            | Self::BLUR_RADIUS.bits()
            | Self::INPUT_SCALE.bits()
            | Self::EDGE_TREATMENT.bits()
            | Self::BACKGROUND_COLOR.bits();

        /// Fields owned by the style layer; propagated into the node tracker on update.
        const STYLE = Self::BLUR_RADIUS.bits()
            | Self::NOISE_FACTOR.bits()
            | Self::MASK.bits()
            | Self::BACKGROUND_COLOR.bits()
            | Self::TINTS.bits()
            | Self::FALLBACK_TINT.bits()
            | Self::ALPHA.bits()
            | Self::PROGRESSIVE.bits()
            | Self::EDGE_TREATMENT.bits()
            | Self::INPUT_SCALE.bits()
            | Self::DRAW_CONTENT_BEHIND.bits()
            | Self::BLUR_ENABLED.bits();

        /// Every field; any of them requires a redraw.
        const INVALIDATE = u32::MAX >> 12;
    }
}

/// Accumulates dirty bits between draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyTracker {
    bits: DirtyFields,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: DirtyFields) {
        self.bits |= flag;
    }

    pub fn clear(&mut self) {
        self.bits = DirtyFields::empty();
    }

    /// True if at least one bit of `group` was set since the last clear.
    pub fn any(&self, group: DirtyFields) -> bool {
        self.bits.intersects(group)
    }

    /// True if every bit of `flag` is set.
    pub fn contains(&self, flag: DirtyFields) -> bool {
        self.bits.contains(flag)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> DirtyFields {
        self.bits
    }

    /// Merge this tracker's bits into `parent`. Child trackers only ever add bits upward.
    pub fn propagate_into(&self, parent: &mut DirtyTracker) {
        parent.set(self.bits);
    }

    /// Assign `value` to `slot`, setting `flag` only when the value actually changes.
    pub fn assign<T: PartialEq>(&mut self, slot: &mut T, value: T, flag: DirtyFields) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        self.set(flag);
        true
    }
}

impl AddAssign<DirtyFields> for DirtyTracker {
    fn add_assign(&mut self, rhs: DirtyFields) {
        self.set(rhs);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effect/dirty.rs"]
mod tests;
