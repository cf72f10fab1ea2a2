use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    area::region::Placement,
    effect::node::EffectId,
    effect::progressive::{Band, generate_bands},
    effect::style::Style,
    foundation::core::{Color, Rect},
    foundation::error::{BackdropError, BackdropResult},
    paint::brush::Brush,
    paint::display_list::{BlendMode, DisplayList},
    render::cpu::{CpuBackend, CpuBackendOpts, Frame},
    scene::backdrop::{Backdrop, BackdropOpts},
};

/// Rectangle fill in the owning region's local coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FillDef {
    pub rect: Rect,
    pub brush: Brush,
    #[serde(default)]
    pub blend: BlendMode,
}

/// Producer area of a scene document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaDef {
    /// Screen-space bounds.
    pub rect: Rect,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub fills: Vec<FillDef>,
}

/// Consumer effect of a scene document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectDef {
    /// Screen-space bounds.
    pub rect: Rect,
    /// Indices into [`SceneDoc::areas`]; empty blurs the effect's own `content`.
    #[serde(default)]
    pub areas: Vec<usize>,
    #[serde(default)]
    pub style: Style,
    /// What the consumer paints itself, in effect-local coordinates.
    #[serde(default)]
    pub content: Vec<FillDef>,
    /// Area the effect is drawn inside of; it is recorded as part of that area.
    #[serde(default)]
    pub parent: Option<usize>,
}

/// A single-frame scene: canvas, producer areas and consumer effects.
///
/// This is the JSON input of the `backdrop` CLI.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDoc {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub opts: BackdropOpts,
    /// Whether the renderer provides blur kernels; without them every effect is a scrim.
    #[serde(default = "kernels_default")]
    pub kernels: bool,
    #[serde(default)]
    pub ambient: Style,
    #[serde(default)]
    pub areas: Vec<AreaDef>,
    #[serde(default)]
    pub effects: Vec<EffectDef>,
}

fn kernels_default() -> bool {
    true
}

impl SceneDoc {
    pub fn from_reader<R: std::io::Read>(r: R) -> BackdropResult<Self> {
        let doc: Self = serde_json::from_reader(r)
            .map_err(|e| BackdropError::serde(format!("parse scene JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_json(s: &str) -> BackdropResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> BackdropResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            BackdropError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> BackdropResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BackdropError::validation("scene width/height must be > 0"));
        }
        self.opts.validate()?;
        self.ambient.validate()?;
        let n_areas = self.areas.len();
        for (i, effect) in self.effects.iter().enumerate() {
            effect.style.validate()?;
            if let Some(&bad) = effect.areas.iter().find(|&&a| a >= n_areas) {
                return Err(BackdropError::validation(format!(
                    "effect {i} references area {bad}, scene has {n_areas}"
                )));
            }
            if let Some(parent) = effect.parent
                && parent >= n_areas
            {
                return Err(BackdropError::validation(format!(
                    "effect {i} has parent area {parent}, scene has {n_areas}"
                )));
            }
        }
        Ok(())
    }

    /// Band sequence of effect `index`'s progressive gradient, resolved against the ambient style.
    pub fn bands(&self, index: usize) -> BackdropResult<Vec<Band>> {
        let effect = self.effects.get(index).ok_or_else(|| {
            BackdropError::validation(format!(
                "effect {index} out of range, scene has {}",
                self.effects.len()
            ))
        })?;
        let style = effect.style.merged_over(&self.ambient);
        let Some(spec) = style.progressive else {
            return Err(BackdropError::validation(format!(
                "effect {index} has no progressive gradient"
            )));
        };
        let step = self.opts.band_step * f64::from(self.opts.density);
        Ok(generate_bands(&spec, effect.rect.size(), step).collect())
    }

    /// Render the scene with the CPU backend.
    ///
    /// Areas are recorded in ascending z, each followed by the effects parented to it; the
    /// remaining effects are drawn on top of all areas.
    #[tracing::instrument(level = "debug", skip(self), fields(areas = self.areas.len(), effects = self.effects.len()))]
    pub fn render(&self) -> BackdropResult<Frame> {
        self.validate()?;
        let mut backend = CpuBackend::new(CpuBackendOpts {
            kernels: self.kernels,
            clear: self.background,
            ..CpuBackendOpts::default()
        });
        let mut bd = Backdrop::new(self.opts)?;
        bd.set_ambient_style(self.ambient.clone())?;

        let mut area_ids = Vec::with_capacity(self.areas.len());
        for def in &self.areas {
            let id = bd.add_area(def.z);
            bd.place_area(id, Placement::at(def.rect.origin(), def.rect.size()))?;
            area_ids.push(id);
        }
        let mut effect_ids = Vec::with_capacity(self.effects.len());
        for def in &self.effects {
            let id = bd.add_effect();
            bd.place_effect(id, Placement::at(def.rect.origin(), def.rect.size()))?;
            bd.set_effect_style(id, def.style.clone())?;
            bd.set_effect_areas(id, def.areas.iter().map(|&i| area_ids[i]).collect())?;
            bd.set_effect_ancestor(id, def.parent.map(|i| area_ids[i]))?;
            effect_ids.push(id);
        }
        bd.update_all(&backend)?;

        let mut order: Vec<usize> = (0..self.areas.len()).collect();
        order.sort_by(|&a, &b| self.areas[a].z.total_cmp(&self.areas[b].z));

        let mut screen = DisplayList::new();
        let mut redraws: Vec<EffectId> = Vec::new();
        for i in order {
            let def = &self.areas[i];
            let id = area_ids[i];
            bd.begin_area_draw(id, &mut redraws)?;
            let mut content = fills(&def.fills);
            for (j, effect) in self.effects.iter().enumerate() {
                if effect.parent != Some(i) {
                    continue;
                }
                let list = bd.draw_effect(effect_ids[j], &mut backend, &fills(&effect.content))?;
                content.with_save(|c| {
                    c.translate(effect.rect.origin() - def.rect.origin());
                    c.append(&list);
                });
            }
            bd.finish_area_draw(id, &mut backend, &content)?;
            screen.with_save(|s| {
                s.translate(def.rect.origin().to_vec2());
                s.append(&content);
            });
        }
        if !redraws.is_empty() {
            tracing::debug!(?redraws, "effects invalidated by cross-window areas");
        }

        for (j, effect) in self.effects.iter().enumerate() {
            if effect.parent.is_some() {
                continue;
            }
            let list = bd.draw_effect(effect_ids[j], &mut backend, &fills(&effect.content))?;
            screen.with_save(|s| {
                s.translate(effect.rect.origin().to_vec2());
                s.append(&list);
            });
        }

        backend.render(&screen, self.width, self.height)
    }
}

fn fills(defs: &[FillDef]) -> DisplayList {
    let mut list = DisplayList::new();
    for def in defs {
        list.fill_rect(def.rect, def.brush.clone(), def.blend);
    }
    list
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
