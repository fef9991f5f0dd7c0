// cardfx_core: Rust/WASM engine for trading card visual effects.
// Composition lives here; the JS side only applies the output to the DOM or a shader material.

mod adapter;
mod compositor;
mod error;
mod intensity;
mod payload;
mod registry;
mod selection;
mod session;
mod types;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

pub use adapter::{uniform_name, DomPatch, RenderAdapter, ShaderBinding, ShaderBranches};
pub use compositor::{compose, style_var_name, CompositedOutput, EffectLayer, SettingsView};
pub use error::EffectsError;
pub use intensity::{EffectParams, IntensityStore};
pub use payload::{RawSettings, SavedEffects};
pub use registry::{EffectDefinition, EffectRegistry};
pub use selection::{ActiveEffectSet, Toggled};
pub use session::EffectSession;
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Build a session from the JSON config handed over by the viewer.
pub fn session_from_config(config_json: &str) -> Result<EffectSession, EffectsError> {
    let config: EngineConfig = serde_json::from_str(config_json)
        .map_err(|e| EffectsError::InvalidConfig(e.to_string()))?;

    let registry = match config.effects {
        Some(effects) => EffectRegistry::new(effects)?,
        None => EffectRegistry::builtin(),
    };

    Ok(EffectSession::from_saved(
        Rc::new(registry),
        config.card_type,
        &config.saved,
    ))
}

fn to_js(err: EffectsError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Main engine interface exposed to JavaScript. One instance per open card viewer.
/// Every call is synchronous; outputs are JSON strings.
#[wasm_bindgen]
pub struct EffectsEngine {
    session: EffectSession,
}

#[wasm_bindgen]
impl EffectsEngine {
    /// Config: `{ "cardType"?: string, "effects"?: [EffectDefinition], "saved"?: { effects, effectSettings } }`.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<EffectsEngine, JsValue> {
        let session = session_from_config(config_json).map_err(to_js)?;
        Ok(EffectsEngine { session })
    }

    /// Toggle an effect. Returns whether it is active afterwards.
    pub fn toggle(&mut self, effect_id: &str) -> bool {
        self.session.toggle(effect_id);
        self.session.is_active(effect_id)
    }

    pub fn remove(&mut self, effect_id: &str) -> bool {
        self.session.remove(effect_id)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    pub fn is_active(&self, effect_id: &str) -> bool {
        self.session.is_active(effect_id)
    }

    /// Store an intensity (clamped to 0-1) and return the effective value.
    pub fn set_intensity(&mut self, effect_id: &str, value: f64) -> f64 {
        self.session.set_intensity(effect_id, value);
        self.session.intensity(effect_id)
    }

    pub fn intensity(&self, effect_id: &str) -> f64 {
        self.session.intensity(effect_id)
    }

    /// Set a parameter (`pattern`, `colorMode`, `speed`, `intensity`) from a JSON scalar.
    pub fn set_param(&mut self, effect_id: &str, key: &str, value_json: &str) -> Result<(), JsValue> {
        let param = ParamKey::parse(key).ok_or_else(|| {
            to_js(EffectsError::InvalidSetting {
                effect: effect_id.to_string(),
                key: key.to_string(),
                reason: "unknown setting".to_string(),
            })
        })?;
        let value: SettingValue = serde_json::from_str(value_json)
            .map_err(|e| to_js(EffectsError::from(e)))?;
        self.session
            .set_param(effect_id, param, value)
            .map_err(to_js)
    }

    /// Active effect ids in paint order, as a JSON array.
    pub fn active_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.active())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Current `CompositedOutput` as JSON.
    pub fn composite_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.output())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// `DomPatch` for the card root element as JSON.
    pub fn dom_patch_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&DomPatch::from_output(self.session.output()))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Save payload `{ effects, effectSettings }` as JSON.
    pub fn save_json(&self) -> Result<String, JsValue> {
        self.session.to_saved().to_json().map_err(to_js)
    }

    /// All registry definitions as JSON.
    pub fn registry_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.registry().all())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Definitions in one category (`"standard"` or `"premium"`) as JSON.
    pub fn registry_by_category_json(&self, category: &str) -> Result<String, JsValue> {
        let category: EffectCategory = serde_json::from_value(serde_json::Value::String(
            category.to_string(),
        ))
        .map_err(|e| to_js(EffectsError::from(e)))?;
        let effects: Vec<&EffectDefinition> =
            self.session.registry().by_category(category).collect();
        serde_json::to_string(&effects)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
