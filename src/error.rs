// Typed errors with thiserror. Surface meaningful messages to JS.
// Only registry loading and config parsing fail; composition never does.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EffectsError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Duplicate effect id: {0}")]
    DuplicateEffect(String),

    #[error("Invalid setting {key:?} on effect {effect}: {reason}")]
    InvalidSetting {
        effect: String,
        key: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EffectsError {
    fn from(err: serde_json::Error) -> Self {
        EffectsError::Serialization(err.to_string())
    }
}
