// Effect session: one card in one viewer/editor.
// Owns the active selection and the settings store behind a single mutation API,
// and memoizes the composited output until the next mutation.

use std::cell::OnceCell;
use std::rc::Rc;

use tracing::debug;

use crate::compositor::{compose, CompositedOutput};
use crate::error::EffectsError;
use crate::intensity::IntensityStore;
use crate::payload::{RawSettings, SavedEffects};
use crate::registry::EffectRegistry;
use crate::selection::{ActiveEffectSet, Toggled};
use crate::types::*;

/// Interactive effect state for a single card. Discarded when the viewer closes;
/// only `to_saved()` output is persisted.
#[derive(Debug, Clone)]
pub struct EffectSession {
    registry: Rc<EffectRegistry>,
    card_type: Option<CardType>,
    active: ActiveEffectSet,
    settings: IntensityStore,
    output: OnceCell<CompositedOutput>,
}

impl EffectSession {
    pub fn new(registry: Rc<EffectRegistry>, card_type: Option<CardType>) -> Self {
        EffectSession {
            registry,
            card_type,
            active: ActiveEffectSet::new(),
            settings: IntensityStore::new(),
            output: OnceCell::new(),
        }
    }

    /// Seed a session from a card record. Stale ids and malformed settings are dropped.
    pub fn from_saved(
        registry: Rc<EffectRegistry>,
        card_type: Option<CardType>,
        saved: &SavedEffects,
    ) -> Self {
        let mut session = EffectSession::new(registry, card_type);

        for id in &saved.effects {
            let id = EffectId::new(id.as_str());
            if !session
                .active
                .insert(&id, &session.registry, session.card_type.as_ref())
            {
                debug!(effect = %id, "Dropping saved effect");
            }
        }

        for (id, raw) in &saved.effect_settings {
            let id = EffectId::new(id.as_str());
            if !session.registry.contains(&id) {
                debug!(effect = %id, "Dropping settings for unknown effect");
                continue;
            }
            session.seed_settings(&id, raw);
        }

        session
    }

    fn seed_settings(&mut self, id: &EffectId, raw: &RawSettings) {
        for (key, value) in raw {
            let Some(param) = ParamKey::parse(key) else {
                debug!(effect = %id, key = key.as_str(), "Dropping unknown setting");
                continue;
            };
            let Some(value) = SettingValue::from_json(value) else {
                debug!(effect = %id, key = key.as_str(), "Dropping non-scalar setting");
                continue;
            };
            if let Err(err) = self.settings.set_param(id, param, value) {
                debug!(effect = %id, error = %err, "Dropping invalid setting");
            }
        }
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn card_type(&self) -> Option<&CardType> {
        self.card_type.as_ref()
    }

    /// Toggle an effect on or off. Unknown or disabled ids change nothing.
    pub fn toggle(&mut self, id: &str) -> Toggled {
        let id = EffectId::new(id);
        let result = self
            .active
            .toggle(&id, &self.registry, self.card_type.as_ref());
        if result.changed() {
            self.invalidate();
        }
        result
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.active.remove(&EffectId::new(id));
        if removed {
            self.invalidate();
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.active.is_empty() {
            self.active.clear();
            self.invalidate();
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains(&EffectId::new(id))
    }

    /// Active ids in paint order.
    pub fn active(&self) -> &[EffectId] {
        self.active.order()
    }

    /// Returns the stored (clamped) value, or `None` if the input was NaN.
    pub fn set_intensity(&mut self, id: &str, value: f64) -> Option<f64> {
        let stored = self.settings.set_intensity(&EffectId::new(id), value);
        if stored.is_some() {
            self.invalidate();
        }
        stored
    }

    pub fn intensity(&self, id: &str) -> f64 {
        self.settings.intensity(&EffectId::new(id), &self.registry)
    }

    pub fn set_param(
        &mut self,
        id: &str,
        key: ParamKey,
        value: SettingValue,
    ) -> Result<(), EffectsError> {
        self.settings.set_param(&EffectId::new(id), key, value)?;
        self.invalidate();
        Ok(())
    }

    pub fn param(&self, id: &str, key: ParamKey) -> Option<SettingValue> {
        self.settings.param(&EffectId::new(id), key, &self.registry)
    }

    /// Composited output, recomputed only after a mutation.
    pub fn output(&self) -> &CompositedOutput {
        self.output
            .get_or_init(|| compose(self.active.order(), &self.settings, &self.registry))
    }

    /// Payload to persist on explicit save: active ids plus explicitly configured settings.
    pub fn to_saved(&self) -> SavedEffects {
        let effects = self
            .active
            .order()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        let effect_settings = self
            .settings
            .iter()
            .map(|(id, params)| {
                let raw: RawSettings = params
                    .iter()
                    .map(|(key, value)| (key.as_str().to_string(), value.to_json()))
                    .collect();
                (id.as_str().to_string(), raw)
            })
            .collect();

        SavedEffects {
            effects,
            effect_settings,
        }
    }

    fn invalidate(&mut self) {
        self.output.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn session() -> EffectSession {
        EffectSession::new(Rc::new(EffectRegistry::builtin()), None)
    }

    #[test]
    fn example_scenario() {
        let mut session = session();

        assert_eq!(session.toggle("holographic"), Toggled::Added);
        session.set_intensity("holographic", 0.9);
        assert_eq!(session.toggle("foil"), Toggled::Added);

        let ids: Vec<_> = session.active().iter().map(EffectId::as_str).collect();
        assert_eq!(ids, vec!["holographic", "foil"]);

        let output = session.output();
        assert_eq!(output.css_classes, vec!["effect-holo", "effect-foil"]);
        assert_eq!(
            output.style_vars.get("--holographic-intensity"),
            Some(&StyleValue::Number(0.9))
        );
        assert_eq!(
            output.style_vars.get("--foil-intensity"),
            Some(&StyleValue::Number(0.6))
        );
    }

    #[test]
    fn output_tracks_mutations() {
        let mut session = session();
        session.toggle("chrome");
        assert_eq!(session.output().css_classes, vec!["effect-chrome"]);

        session.set_intensity("chrome", 0.1);
        assert_eq!(
            session.output().style_vars.get("--chrome-intensity"),
            Some(&StyleValue::Number(0.1))
        );

        session.remove("chrome");
        assert!(session.output().is_empty());
    }

    #[test]
    fn intensity_before_activation() {
        let mut session = session();
        session.set_intensity("gold", 0.2);
        assert!(session.output().is_empty());

        session.toggle("gold");
        assert_eq!(
            session.output().style_vars.get("--gold-intensity"),
            Some(&StyleValue::Number(0.2))
        );
    }

    #[test]
    fn unknown_toggle_leaves_output_alone() {
        let mut session = session();
        session.toggle("foil");
        let before = session.output().clone();

        assert_eq!(session.toggle("nonexistent-effect"), Toggled::Ignored);
        assert_eq!(session.output(), &before);
    }

    #[test]
    fn clamps_through_session() {
        let mut session = session();
        assert_eq!(session.set_intensity("holographic", 1.5), Some(1.0));
        assert_eq!(session.intensity("holographic"), 1.0);
        assert_eq!(session.set_intensity("holographic", -0.3), Some(0.0));
        assert_eq!(session.intensity("holographic"), 0.0);
    }

    #[test]
    fn set_param_shows_in_output() {
        let mut session = session();
        session.toggle("holographic");
        session
            .set_param("holographic", ParamKey::Pattern, SettingValue::from("diamond"))
            .unwrap();
        assert_eq!(
            session.output().style_vars.get("--holographic-pattern"),
            Some(&StyleValue::from("diamond"))
        );
        assert_eq!(
            session.param("holographic", ParamKey::Pattern),
            Some(SettingValue::from("diamond"))
        );
    }

    #[test]
    fn card_type_limits_toggle() {
        let registry = EffectRegistry::new(vec![
            crate::registry::EffectDefinition::new("holographic", "Holo", "effect-holo"),
            crate::registry::EffectDefinition::new("autograph", "Autograph", "effect-auto")
                .for_card_types(&["legendary"]),
        ])
        .unwrap();
        let mut session = EffectSession::new(Rc::new(registry), Some(CardType::new("base")));

        assert_eq!(session.toggle("autograph"), Toggled::Ignored);
        assert_eq!(session.toggle("holographic"), Toggled::Added);
    }

    #[test]
    fn seed_then_save_round_trips() {
        let json = r#"{
            "effects": ["holographic", "foil"],
            "effectSettings": {
                "holographic": { "intensity": 0.9, "pattern": "radial" },
                "foil": { "colorMode": "gold", "speed": 1.5 },
                "vintage": { "intensity": 0.25 }
            }
        }"#;
        let saved = SavedEffects::from_json(json).unwrap();
        let session = EffectSession::from_saved(Rc::new(EffectRegistry::builtin()), None, &saved);

        assert_eq!(session.to_saved(), saved);
    }

    #[test]
    fn whole_number_settings_round_trip() {
        let json = r#"{
            "effects": ["prismatic", "holographic"],
            "effectSettings": {
                "prismatic": { "intensity": 1, "speed": 2 },
                "holographic": { "intensity": 0 }
            }
        }"#;
        let saved = SavedEffects::from_json(json).unwrap();
        let session = EffectSession::from_saved(Rc::new(EffectRegistry::builtin()), None, &saved);

        assert_eq!(session.to_saved(), saved);
        assert_eq!(
            session.to_saved().to_json().unwrap(),
            r#"{"effects":["prismatic","holographic"],"effectSettings":{"holographic":{"intensity":0},"prismatic":{"intensity":1,"speed":2}}}"#
        );
    }

    #[test]
    fn nan_param_keeps_cached_output() {
        let mut session = session();
        session.toggle("foil");
        let before = session.output().clone();

        assert!(session
            .set_param("foil", ParamKey::Intensity, SettingValue::Number(f64::NAN))
            .is_err());
        assert_eq!(session.output(), &before);
        assert_eq!(session.intensity("foil"), 0.6);
    }

    #[test]
    fn seed_drops_stale_and_malformed_data() {
        let json = r#"{
            "effects": ["nonexistent-effect", "foil", "ink", "foil"],
            "effectSettings": {
                "nonexistent-effect": { "intensity": 0.4 },
                "foil": { "intensity": 4, "glitter": true, "pattern": 12, "colorMode": ["x"] }
            }
        }"#;
        let saved = SavedEffects::from_json(json).unwrap();
        let session = EffectSession::from_saved(Rc::new(EffectRegistry::builtin()), None, &saved);

        let restored = session.to_saved();
        assert_eq!(restored.effects, vec!["foil"]);
        assert_eq!(restored.effect_settings.len(), 1);
        assert_eq!(
            restored.effect_settings["foil"],
            RawSettings::from([("intensity".to_string(), serde_json::json!(1))])
        );
    }

    #[test]
    fn save_payload_is_plain_json() {
        let mut session = session();
        session.toggle("prismatic");
        session.set_intensity("prismatic", 0.4);
        let json = session.to_saved().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["effects"][0], "prismatic");
        assert_eq!(value["effectSettings"]["prismatic"]["intensity"], 0.4);
    }

    proptest! {
        #[test]
        fn unknown_toggle_never_changes_state(
            ids in prop::collection::vec(
                prop::sample::select(vec!["holographic", "foil", "chrome", "gold"]),
                0..6,
            ),
            unknown in "[a-z]{1,12}-missing",
        ) {
            let mut session = session();
            for id in ids {
                session.toggle(id);
            }
            let order_before = session.active().to_vec();
            let output_before = session.output().clone();

            prop_assert_eq!(session.toggle(&unknown), Toggled::Ignored);
            prop_assert_eq!(session.active(), order_before.as_slice());
            prop_assert_eq!(session.output(), &output_before);
        }
    }
}
