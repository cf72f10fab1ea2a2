pub(crate) mod region;
pub(crate) mod registry;
