pub(crate) mod brush;
pub(crate) mod display_list;
