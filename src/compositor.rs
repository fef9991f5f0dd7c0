// Effect compositor: active effects + settings -> CSS classes, style variables, layers.
// Pure and deterministic. Never fails; bad input drops the offending effect only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::intensity::IntensityStore;
use crate::registry::{EffectDefinition, EffectRegistry};
use crate::types::*;

/// Read access to stored per-effect settings.
pub trait SettingsView {
    fn stored(&self, id: &EffectId, key: ParamKey) -> Option<SettingValue>;
}

impl SettingsView for IntensityStore {
    fn stored(&self, id: &EffectId, key: ParamKey) -> Option<SettingValue> {
        IntensityStore::stored(self, id, key).cloned()
    }
}

/// Bare intensity map, as handed over by callers that track nothing else.
impl SettingsView for BTreeMap<EffectId, f64> {
    fn stored(&self, id: &EffectId, key: ParamKey) -> Option<SettingValue> {
        match key {
            ParamKey::Intensity => self.get(id).copied().map(SettingValue::Number),
            _ => None,
        }
    }
}

/// One rendered effect overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectLayer {
    pub effect_id: EffectId,
    pub css_class: String,
    pub intensity: f64,
    /// 1-based paint position. Higher paints on top.
    pub z_index: u32,
}

/// Render-ready output consumed by a renderer adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositedOutput {
    /// One class per rendered effect, in paint order.
    pub css_classes: Vec<String>,
    /// CSS custom properties (`--holographic-intensity`, `--foil-color-mode`, ...).
    pub style_vars: BTreeMap<String, StyleValue>,
    /// Overlays bottom to top.
    pub layers: Vec<EffectLayer>,
    /// Visual properties after paint-order resolution; the topmost effect wins.
    pub properties: BTreeMap<String, String>,
}

impl CompositedOutput {
    pub fn is_empty(&self) -> bool {
        self.css_classes.is_empty()
    }

    /// Space-separated class list.
    pub fn class_name(&self) -> String {
        self.css_classes.join(" ")
    }

    pub fn numeric_vars(&self) -> impl Iterator<Item = (&str, f64)> {
        self.style_vars
            .iter()
            .filter_map(|(name, value)| value.as_number().map(|n| (name.as_str(), n)))
    }

    pub fn text_vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.style_vars
            .iter()
            .filter_map(|(name, value)| value.as_text().map(|s| (name.as_str(), s)))
    }
}

/// Name of the CSS custom property for an effect parameter.
pub fn style_var_name(id: &EffectId, key: ParamKey) -> String {
    format!("--{}-{}", id, key.css_suffix())
}

/// Compose the active effects in paint order.
pub fn compose<S: SettingsView + ?Sized>(
    order: &[EffectId],
    settings: &S,
    registry: &EffectRegistry,
) -> CompositedOutput {
    let mut output = CompositedOutput::default();

    for id in order {
        let Some(definition) = registry.get(id) else {
            debug!(effect = %id, "Skipping unknown effect");
            continue;
        };
        if !definition.enabled {
            debug!(effect = %id, "Skipping disabled effect");
            continue;
        }
        let Some(intensity) = resolve_intensity(id, definition, settings) else {
            continue;
        };

        output.css_classes.push(definition.css_class.clone());
        output.layers.push(EffectLayer {
            effect_id: id.clone(),
            css_class: definition.css_class.clone(),
            intensity,
            z_index: output.layers.len() as u32 + 1,
        });
        output.style_vars.insert(
            style_var_name(id, ParamKey::Intensity),
            StyleValue::Number(intensity),
        );

        for key in [ParamKey::Pattern, ParamKey::ColorMode, ParamKey::Speed] {
            if let Some(value) = resolve_param(id, definition, key, settings) {
                output.style_vars.insert(style_var_name(id, key), value);
            }
        }

        // Later effects overwrite earlier ones.
        for (property, value) in &definition.css_properties {
            output.properties.insert(property.clone(), value.clone());
        }
    }

    trace!(
        layers = output.layers.len(),
        vars = output.style_vars.len(),
        "Composited effects"
    );
    output
}

/// Stored intensity, registry default, or `DEFAULT_INTENSITY`.
/// `None` when the stored value is unusable; the effect is then not rendered.
fn resolve_intensity<S: SettingsView + ?Sized>(
    id: &EffectId,
    definition: &EffectDefinition,
    settings: &S,
) -> Option<f64> {
    match settings.stored(id, ParamKey::Intensity) {
        Some(SettingValue::Number(n)) if Intensity::is_valid(n) => Some(n),
        Some(other) => {
            debug!(effect = %id, value = %other, "Skipping effect with malformed intensity");
            None
        }
        None => Some(definition.default_intensity().unwrap_or(DEFAULT_INTENSITY)),
    }
}

fn resolve_param<S: SettingsView + ?Sized>(
    id: &EffectId,
    definition: &EffectDefinition,
    key: ParamKey,
    settings: &S,
) -> Option<SettingValue> {
    if let Some(value) = settings.stored(id, key) {
        if value.kind() == key.value_kind() {
            return Some(value);
        }
        debug!(effect = %id, key = %key, "Ignoring stored parameter of the wrong type");
    }
    definition.default_settings.get(&key).cloned()
}
