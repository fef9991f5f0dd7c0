// Per-session effect settings: intensity plus pattern, color mode, and speed.
// Settings are keyed by effect id and independent of whether the effect is active,
// so a slider can be adjusted before the effect is toggled on.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::EffectsError;
use crate::registry::EffectRegistry;
use crate::types::*;

/// Stored settings for one effect.
pub type EffectParams = BTreeMap<ParamKey, SettingValue>;

/// Mutable settings store owned by a viewer/editor session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensityStore {
    settings: BTreeMap<EffectId, EffectParams>,
}

impl IntensityStore {
    pub fn new() -> Self {
        IntensityStore {
            settings: BTreeMap::new(),
        }
    }

    /// Store an intensity, clamped to 0.0-1.0. NaN is ignored.
    /// Returns the stored value.
    pub fn set_intensity(&mut self, id: &EffectId, value: f64) -> Option<f64> {
        let Some(intensity) = Intensity::new(value) else {
            debug!(effect = %id, "Ignoring NaN intensity");
            return None;
        };
        self.settings
            .entry(id.clone())
            .or_default()
            .insert(ParamKey::Intensity, SettingValue::Number(intensity.value()));
        Some(intensity.value())
    }

    /// Effective intensity: stored value, else registry default, else `DEFAULT_INTENSITY`.
    pub fn intensity(&self, id: &EffectId, registry: &EffectRegistry) -> f64 {
        self.stored_intensity(id)
            .or_else(|| registry.get(id).and_then(|d| d.default_intensity()))
            .unwrap_or(DEFAULT_INTENSITY)
    }

    pub fn stored_intensity(&self, id: &EffectId) -> Option<f64> {
        self.stored(id, ParamKey::Intensity)
            .and_then(SettingValue::as_number)
    }

    /// Store any schema parameter. Intensity writes are clamped like `set_intensity`.
    pub fn set_param(
        &mut self,
        id: &EffectId,
        key: ParamKey,
        value: SettingValue,
    ) -> Result<(), EffectsError> {
        if value.kind() != key.value_kind() {
            return Err(EffectsError::InvalidSetting {
                effect: id.to_string(),
                key: key.to_string(),
                reason: format!("expected {:?}, got {:?}", key.value_kind(), value.kind()),
            });
        }
        match (key, value) {
            (ParamKey::Intensity, SettingValue::Number(n)) => {
                if self.set_intensity(id, n).is_none() {
                    return Err(EffectsError::InvalidSetting {
                        effect: id.to_string(),
                        key: key.to_string(),
                        reason: "intensity is NaN".to_string(),
                    });
                }
            }
            (ParamKey::Speed, SettingValue::Number(n)) if !n.is_finite() => {
                return Err(EffectsError::InvalidSetting {
                    effect: id.to_string(),
                    key: key.to_string(),
                    reason: "speed must be finite".to_string(),
                });
            }
            (key, value) => {
                self.settings.entry(id.clone()).or_default().insert(key, value);
            }
        }
        Ok(())
    }

    /// Effective parameter: stored value, else the registry default.
    pub fn param(
        &self,
        id: &EffectId,
        key: ParamKey,
        registry: &EffectRegistry,
    ) -> Option<SettingValue> {
        if key == ParamKey::Intensity {
            return Some(SettingValue::Number(self.intensity(id, registry)));
        }
        self.stored(id, key)
            .or_else(|| registry.get(id).and_then(|d| d.default_settings.get(&key)))
            .cloned()
    }

    pub fn stored(&self, id: &EffectId, key: ParamKey) -> Option<&SettingValue> {
        self.settings.get(id).and_then(|p| p.get(&key))
    }

    /// Explicitly configured settings for one effect.
    pub fn params(&self, id: &EffectId) -> Option<&EffectParams> {
        self.settings.get(id)
    }

    /// All configured effects, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = (&EffectId, &EffectParams)> {
        self.settings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}
