// Effect registry: static catalog of effect definitions.
// Read-only after load. Lookups of unknown ids return None, never an error.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::EffectsError;
use crate::types::*;

/// Immutable description of one visual effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDefinition {
    pub id: EffectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: EffectCategory,
    #[serde(default)]
    pub default_settings: BTreeMap<ParamKey, SettingValue>,
    pub css_class: String,
    /// Visual properties this effect sets on the card root (e.g. `mix-blend-mode`).
    /// When two active effects set the same property, the later one in paint order wins.
    #[serde(default)]
    pub css_properties: BTreeMap<String, String>,
    #[serde(default = "default_card_types")]
    pub supported_card_types: Vec<CardType>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_card_types() -> Vec<CardType> {
    vec![CardType::all()]
}

fn default_true() -> bool {
    true
}

impl EffectDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, css_class: impl Into<String>) -> Self {
        EffectDefinition {
            id: EffectId::new(id),
            name: name.into(),
            description: String::new(),
            category: EffectCategory::Standard,
            default_settings: BTreeMap::new(),
            css_class: css_class.into(),
            css_properties: BTreeMap::new(),
            supported_card_types: default_card_types(),
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_setting(mut self, key: ParamKey, value: impl Into<SettingValue>) -> Self {
        self.default_settings.insert(key, value.into());
        self
    }

    pub fn with_css_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.css_properties.insert(name.into(), value.into());
        self
    }

    pub fn for_card_types(mut self, types: &[&str]) -> Self {
        self.supported_card_types = types.iter().map(|t| CardType::new(*t)).collect();
        self
    }

    pub fn premium(mut self) -> Self {
        self.category = EffectCategory::Premium;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Registry default intensity, if the definition declares one.
    pub fn default_intensity(&self) -> Option<f64> {
        self.default_settings
            .get(&ParamKey::Intensity)
            .and_then(SettingValue::as_number)
    }

    pub fn supports(&self, card_type: &CardType) -> bool {
        self.supported_card_types
            .iter()
            .any(|t| t.is_wildcard() || t == card_type)
    }

    /// Check default settings against the parameter schema.
    fn validate(&self) -> Result<(), EffectsError> {
        for (key, value) in &self.default_settings {
            if value.kind() != key.value_kind() {
                return Err(EffectsError::InvalidSetting {
                    effect: self.id.to_string(),
                    key: key.to_string(),
                    reason: format!("expected {:?}, got {:?}", key.value_kind(), value.kind()),
                });
            }
            if *key == ParamKey::Intensity {
                let n = value.as_number().unwrap_or(f64::NAN);
                if !Intensity::is_valid(n) {
                    return Err(EffectsError::InvalidSetting {
                        effect: self.id.to_string(),
                        key: key.to_string(),
                        reason: format!("default intensity {} outside 0.0-1.0", n),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Catalog of effect definitions, kept in declaration order.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    effects: Vec<EffectDefinition>,
    index: HashMap<EffectId, usize>,
}

impl EffectRegistry {
    /// Build a registry, validating ids and default settings.
    pub fn new(effects: Vec<EffectDefinition>) -> Result<Self, EffectsError> {
        let mut index = HashMap::with_capacity(effects.len());
        for (i, effect) in effects.iter().enumerate() {
            effect.validate()?;
            if index.insert(effect.id.clone(), i).is_some() {
                return Err(EffectsError::DuplicateEffect(effect.id.to_string()));
            }
        }
        Ok(EffectRegistry { effects, index })
    }

    /// Load a registry from a JSON array of definitions.
    pub fn from_json(json: &str) -> Result<Self, EffectsError> {
        let effects: Vec<EffectDefinition> = serde_json::from_str(json)?;
        Self::new(effects)
    }

    /// The catalog shipped with the viewer.
    pub fn builtin() -> Self {
        let effects = builtin_effects();
        let index = effects
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        EffectRegistry { effects, index }
    }

    pub fn all(&self) -> &[EffectDefinition] {
        &self.effects
    }

    pub fn get(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.index.get(id).map(|&i| &self.effects[i])
    }

    pub fn get_str(&self, id: &str) -> Option<&EffectDefinition> {
        self.get(&EffectId::new(id))
    }

    pub fn contains(&self, id: &EffectId) -> bool {
        self.index.contains_key(id)
    }

    pub fn by_category(&self, category: EffectCategory) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.iter().filter(move |e| e.category == category)
    }

    /// Enabled effects that can be applied to the given card type.
    pub fn for_card_type<'a>(
        &'a self,
        card_type: &'a CardType,
    ) -> impl Iterator<Item = &'a EffectDefinition> {
        self.effects
            .iter()
            .filter(move |e| e.enabled && e.supports(card_type))
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

fn builtin_effects() -> Vec<EffectDefinition> {
    vec![
        EffectDefinition::new("holographic", "Holographic", "effect-holo")
            .with_description("Rainbow sheen that shifts with viewing angle")
            .with_setting(ParamKey::Intensity, 0.7)
            .with_setting(ParamKey::Pattern, "linear")
            .with_setting(ParamKey::ColorMode, "rainbow")
            .with_css_property("mix-blend-mode", "color-dodge"),
        EffectDefinition::new("refractor", "Refractor", "effect-refractor")
            .with_description("Prismatic light bands across the card face")
            .with_setting(ParamKey::Intensity, 0.6)
            .with_setting(ParamKey::Pattern, "radial")
            .with_css_property("mix-blend-mode", "overlay"),
        EffectDefinition::new("foil", "Foil", "effect-foil")
            .with_description("Metallic foil stamp")
            .with_setting(ParamKey::Intensity, 0.6)
            .with_setting(ParamKey::ColorMode, "silver")
            .with_css_property("mix-blend-mode", "overlay"),
        EffectDefinition::new("vintage", "Vintage", "effect-vintage")
            .with_description("Aged paper tone and soft grain")
            .with_setting(ParamKey::Intensity, 0.5)
            .with_setting(ParamKey::ColorMode, "sepia")
            .with_css_property("mix-blend-mode", "multiply")
            .with_css_property("filter", "sepia(0.4)"),
        EffectDefinition::new("chrome", "Chrome", "effect-chrome")
            .with_description("Mirror-finish reflection")
            .with_setting(ParamKey::Intensity, 0.8)
            .with_css_property("mix-blend-mode", "screen"),
        EffectDefinition::new("crystal", "Crystal", "effect-crystal")
            .with_description("Faceted crystalline highlights")
            .with_setting(ParamKey::Intensity, 0.65)
            .with_setting(ParamKey::Pattern, "diamond")
            .with_css_property("mix-blend-mode", "soft-light"),
        EffectDefinition::new("gold", "Gold Foil", "effect-gold")
            .with_description("Premium gold leaf finish")
            .with_setting(ParamKey::Intensity, 0.75)
            .with_setting(ParamKey::ColorMode, "gold")
            .with_css_property("mix-blend-mode", "color-dodge")
            .premium(),
        EffectDefinition::new("prismatic", "Prismatic", "effect-prismatic")
            .with_description("Animated spectrum sweep")
            .with_setting(ParamKey::Intensity, 0.7)
            .with_setting(ParamKey::Pattern, "linear")
            .with_setting(ParamKey::Speed, 1.0)
            .with_css_property("mix-blend-mode", "hard-light")
            .premium(),
        EffectDefinition::new("ink", "Ink Wash", "effect-ink")
            .with_description("Hand-inked outline treatment")
            .with_setting(ParamKey::Intensity, 0.5)
            .for_card_types(&["legendary"])
            .premium()
            .disabled(),
    ]
}
