// Persisted form of a card's effects: active ids plus per-effect settings.
// Plain JSON data only, so the backend client can write it as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EffectsError;

/// Settings as stored on the card record, keyed by setting name.
pub type RawSettings = BTreeMap<String, serde_json::Value>;

/// `{ effects, effectSettings }` as read from and written to a card record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEffects {
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub effect_settings: BTreeMap<String, RawSettings>,
}

impl SavedEffects {
    pub fn from_json(json: &str) -> Result<Self, EffectsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, EffectsError> {
        Ok(serde_json::to_string(self)?)
    }
}
