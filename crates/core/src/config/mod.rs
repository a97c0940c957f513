use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MetronomeConfig, Result, RhythmConfig, TrainingSnapshot};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Control values the training panel starts with.
    pub training: TrainingSnapshot,
    pub rhythm: RhythmConfig,
    pub metronome: MetronomeConfig,
}

impl AppConfig {
    /// Parses a JSON document; absent sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading configuration");
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.rhythm.validate()?;
        self.metronome.validate()
    }
}
