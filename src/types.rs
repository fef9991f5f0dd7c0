// Strong typing over strings. Newtypes for effect ids, card types, and intensities.
// Settings follow a strict schema (ParamKey) instead of free-form objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payload::SavedEffects;
use crate::registry::EffectDefinition;

/// Fallback intensity when neither the session nor the registry has a value.
pub const DEFAULT_INTENSITY: f64 = 0.5;

/// Stable effect key. Used as a foreign key everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(String);

impl EffectId {
    pub fn new(id: impl Into<String>) -> Self {
        EffectId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EffectId {
    fn from(id: &str) -> Self {
        EffectId::new(id)
    }
}

/// Card type tag ("base", "rookie", ...). `"all"` is the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardType(String);

impl CardType {
    pub const ALL: &'static str = "all";

    pub fn new(tag: impl Into<String>) -> Self {
        CardType(tag.into())
    }

    pub fn all() -> Self {
        CardType(Self::ALL.to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::ALL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Effect tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectCategory {
    #[default]
    Standard,
    Premium,
}

/// Kind of value a setting accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Text,
}

/// Known per-effect setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKey {
    /// Effect strength, 0.0-1.0.
    Intensity,
    /// Overlay pattern ("linear", "radial", "diamond", ...).
    Pattern,
    /// Color treatment ("rainbow", "sepia", "gold", ...).
    ColorMode,
    /// Animation speed multiplier.
    Speed,
}

impl ParamKey {
    pub const ALL: [ParamKey; 4] = [
        ParamKey::Intensity,
        ParamKey::Pattern,
        ParamKey::ColorMode,
        ParamKey::Speed,
    ];

    /// Key as it appears in persisted settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Intensity => "intensity",
            ParamKey::Pattern => "pattern",
            ParamKey::ColorMode => "colorMode",
            ParamKey::Speed => "speed",
        }
    }

    /// Suffix used in CSS custom property names.
    pub fn css_suffix(&self) -> &'static str {
        match self {
            ParamKey::Intensity => "intensity",
            ParamKey::Pattern => "pattern",
            ParamKey::ColorMode => "color-mode",
            ParamKey::Speed => "speed",
        }
    }

    pub fn parse(key: &str) -> Option<ParamKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            ParamKey::Intensity | ParamKey::Speed => ValueKind::Number,
            ParamKey::Pattern | ParamKey::ColorMode => ValueKind::Text,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A setting or style variable value. Plain JSON number or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Number(_) => ValueKind::Number,
            SettingValue::Text(_) => ValueKind::Text,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            SettingValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Number(_) => None,
            SettingValue::Text(s) => Some(s),
        }
    }

    /// Convert a raw JSON value. Only numbers and strings are settings.
    pub fn from_json(value: &serde_json::Value) -> Option<SettingValue> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(SettingValue::Number),
            serde_json::Value::String(s) => Some(SettingValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Whole numbers are written as JSON integers, matching `JSON.stringify`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SettingValue::Number(n) if is_whole(*n) => {
                serde_json::Value::Number(serde_json::Number::from(*n as i64))
            }
            SettingValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            SettingValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

fn is_whole(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SettingValue {
    fn from(n: f64) -> Self {
        SettingValue::Number(n)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_string())
    }
}

/// Style variables share the setting value shape.
pub type StyleValue = SettingValue;

/// Normalized effect strength (0.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intensity(f64);

impl Intensity {
    /// Clamps into range. NaN has no meaningful clamp and yields `None`.
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Intensity(value.clamp(0.0, 1.0)))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// True for values a renderer can use as-is.
    pub fn is_valid(value: f64) -> bool {
        (0.0..=1.0).contains(&value)
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Intensity(DEFAULT_INTENSITY)
    }
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Card type of the card being viewed. `None` accepts every effect.
    #[serde(default)]
    pub card_type: Option<CardType>,
    /// Custom catalog. Falls back to the built-in registry when absent.
    #[serde(default)]
    pub effects: Option<Vec<EffectDefinition>>,
    /// Persisted effect list and settings to seed the session with.
    #[serde(default)]
    pub saved: SavedEffects,
}
