pub(crate) mod compositor;
pub(crate) mod dirty;
pub(crate) mod easing;
pub(crate) mod input_scale;
pub(crate) mod node;
pub(crate) mod progressive;
pub(crate) mod strategy;
pub(crate) mod style;
pub(crate) mod tint;
