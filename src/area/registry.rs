use std::collections::BTreeMap;

use crate::{
    area::region::{Area, AreaId},
    foundation::error::{BackdropError, BackdropResult},
};

/// Caller-supplied filter deciding whether a consumer may draw an area.
pub type AreaPredicate = Box<dyn Fn(&Area) -> bool>;

/// Producer areas, keyed by id.
#[derive(Debug, Default)]
pub struct AreaRegistry {
    areas: BTreeMap<AreaId, Area>,
    next_id: u32,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, z_index: f32) -> AreaId {
        let id = AreaId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.areas.insert(id, Area::new(id, z_index));
        id
    }

    pub fn remove(&mut self, id: AreaId) -> Option<Area> {
        self.areas.remove(&id)
    }

    pub fn get(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    pub fn get_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        self.areas.get_mut(&id)
    }

    pub(crate) fn require_mut(&mut self, id: AreaId) -> BackdropResult<&mut Area> {
        self.areas
            .get_mut(&id)
            .ok_or_else(|| BackdropError::detached(format!("unknown area {id:?}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Area> {
        self.areas.values_mut()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Areas from `ids` that still exist, in the order given.
    pub fn lookup<'a>(&'a self, ids: &'a [AreaId]) -> impl Iterator<Item = &'a Area> + 'a {
        ids.iter().filter_map(|id| self.areas.get(id))
    }
}

/// Areas a consumer should composite, in paint order (ascending z).
///
/// A predicate, when given, is the only filter. Otherwise, when the consumer sits inside a
/// producer with z-index `ancestor_z`, only areas strictly below it are kept so content
/// painted on top of the consumer is never composited behind it.
pub fn resolve_visible_areas<'a>(
    areas: impl IntoIterator<Item = &'a Area>,
    ancestor_z: Option<f32>,
    predicate: Option<&dyn Fn(&Area) -> bool>,
) -> Vec<&'a Area> {
    let mut out: Vec<&Area> = match (predicate, ancestor_z) {
        (Some(pred), _) => areas.into_iter().filter(|a| pred(a)).collect(),
        (None, Some(z)) => areas.into_iter().filter(|a| a.z_index() < z).collect(),
        (None, None) => areas.into_iter().collect(),
    };
    out.sort_by(|a, b| a.z_index().total_cmp(&b.z_index()));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/area/registry.rs"]
mod tests;
