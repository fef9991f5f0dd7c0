// Renderer adapter contracts. The compositor does not know which adapter consumes it.
// DOM path: class list + inline custom properties. Shader path: numeric uniforms
// plus discrete branches for text parameters, looked up in a table the adapter owns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compositor::CompositedOutput;

/// Anything that turns composited output into pixels.
pub trait RenderAdapter {
    type Error;

    fn render(&mut self, output: &CompositedOutput) -> Result<(), Self::Error>;
}

/// Everything a DOM adapter writes to the card root element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomPatch {
    pub class_name: String,
    /// Inline style declarations: custom properties first, then resolved properties.
    pub style: Vec<(String, String)>,
}

impl DomPatch {
    pub fn from_output(output: &CompositedOutput) -> Self {
        let vars = output
            .style_vars
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()));
        let props = output
            .properties
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));

        DomPatch {
            class_name: output.class_name(),
            style: vars.chain(props).collect(),
        }
    }

    /// `name: value; ...` for a `style` attribute.
    pub fn style_text(&self) -> String {
        self.style
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Uniform values for a card material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderBinding {
    pub uniforms: BTreeMap<String, f32>,
    pub branches: BTreeMap<String, i32>,
}

/// Adapter-owned lookup from text parameters to shader branch indices.
#[derive(Debug, Clone, Default)]
pub struct ShaderBranches {
    table: BTreeMap<String, i32>,
}

impl ShaderBranches {
    pub fn new() -> Self {
        ShaderBranches {
            table: BTreeMap::new(),
        }
    }

    /// Table covering the built-in patterns and color modes.
    pub fn standard() -> Self {
        ShaderBranches::new()
            .with("linear", 0)
            .with("radial", 1)
            .with("diamond", 2)
            .with("rainbow", 0)
            .with("silver", 1)
            .with("gold", 2)
            .with("sepia", 3)
    }

    pub fn with(mut self, value: impl Into<String>, branch: i32) -> Self {
        self.table.insert(value.into(), branch);
        self
    }

    pub fn branch(&self, value: &str) -> Option<i32> {
        self.table.get(value).copied()
    }

    /// Map style variables onto uniforms. `--holographic-intensity` becomes
    /// `u_holographic_intensity`. Unmapped text values are left out.
    pub fn bind(&self, output: &CompositedOutput) -> ShaderBinding {
        let uniforms = output
            .numeric_vars()
            .map(|(name, value)| (uniform_name(name), value as f32))
            .collect();

        let mut branches = BTreeMap::new();
        for (name, value) in output.text_vars() {
            match self.branch(value) {
                Some(branch) => {
                    branches.insert(uniform_name(name), branch);
                }
                None => debug!(var = name, value, "No shader branch for value"),
            }
        }

        ShaderBinding { uniforms, branches }
    }
}

/// `--foil-color-mode` -> `u_foil_color_mode`.
pub fn uniform_name(style_var: &str) -> String {
    let trimmed = style_var.trim_start_matches("--");
    format!("u_{}", trimmed.replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::IntensityStore;
    use crate::registry::EffectRegistry;
    use crate::types::EffectId;

    fn output(ids: &[&str]) -> CompositedOutput {
        let order: Vec<EffectId> = ids.iter().map(|id| EffectId::new(*id)).collect();
        crate::compositor::compose(&order, &IntensityStore::new(), &EffectRegistry::builtin())
    }

    #[derive(Default)]
    struct RecordingDom {
        applied: Vec<DomPatch>,
    }

    impl RenderAdapter for RecordingDom {
        type Error = std::convert::Infallible;

        fn render(&mut self, output: &CompositedOutput) -> Result<(), Self::Error> {
            self.applied.push(DomPatch::from_output(output));
            Ok(())
        }
    }

    #[test]
    fn dom_patch_from_output() {
        let patch = DomPatch::from_output(&output(&["holographic", "foil"]));
        assert_eq!(patch.class_name, "effect-holo effect-foil");
        assert!(patch
            .style
            .contains(&("--foil-intensity".to_string(), "0.6".to_string())));
        assert!(patch
            .style
            .contains(&("mix-blend-mode".to_string(), "overlay".to_string())));
        assert!(patch.style_text().contains("--holographic-pattern: linear"));
    }

    #[test]
    fn adapter_receives_output() {
        let mut dom = RecordingDom::default();
        dom.render(&output(&["chrome"])).unwrap();
        assert_eq!(dom.applied.len(), 1);
        assert_eq!(dom.applied[0].class_name, "effect-chrome");
    }

    #[test]
    fn shader_binding_splits_numbers_and_branches() {
        let binding = ShaderBranches::standard().bind(&output(&["holographic", "prismatic"]));

        assert_eq!(binding.uniforms.get("u_holographic_intensity"), Some(&0.7));
        assert_eq!(binding.uniforms.get("u_prismatic_speed"), Some(&1.0));
        assert_eq!(binding.branches.get("u_holographic_pattern"), Some(&0));
        assert_eq!(binding.branches.get("u_holographic_color_mode"), Some(&0));
        assert!(!binding.uniforms.contains_key("u_holographic_pattern"));
    }

    #[test]
    fn unmapped_text_is_skipped() {
        let binding = ShaderBranches::new().bind(&output(&["vintage"]));
        assert!(binding.branches.is_empty());
        assert_eq!(binding.uniforms.get("u_vintage_intensity"), Some(&0.5));
    }

    #[test]
    fn uniform_names() {
        assert_eq!(uniform_name("--foil-color-mode"), "u_foil_color_mode");
        assert_eq!(uniform_name("--holographic-intensity"), "u_holographic_intensity");
    }
}
