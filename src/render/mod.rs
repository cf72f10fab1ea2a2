pub(crate) mod backend;
pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod cpu;
pub(crate) mod pixmap;
pub(crate) mod pool;
