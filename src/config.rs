// Sat Feb 14 2026 - Alex

use crate::scripting::behaviour::{DEFAULT_EVENT_TABLE, DEFAULT_UPDATE_FUNCTION};
use crate::scripting::engine::ScriptLanguage;
use crate::utils::logging::LoggingUtils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for running a script behaviour. Missing keys in a config file fall back
/// to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub default_language: ScriptLanguage,
    pub update_function: String,
    pub event_table: String,
    pub frames: u32,
    pub delta_time: f64,
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_language: ScriptLanguage::Lua,
            update_function: DEFAULT_UPDATE_FUNCTION.to_string(),
            event_table: DEFAULT_EVENT_TABLE.to_string(),
            frames: 1,
            delta_time: 1.0 / 60.0,
            log_level: "warn".to_string(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: HostConfig = serde_json::from_str(text)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_language(mut self, language: ScriptLanguage) -> Self {
        self.default_language = language;
        self
    }

    pub fn with_update_function(mut self, name: &str) -> Self {
        self.update_function = name.to_string();
        self
    }

    pub fn with_event_table(mut self, name: &str) -> Self {
        self.event_table = name.to_string();
        self
    }

    pub fn with_frames(mut self, frames: u32) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.update_function.trim().is_empty() {
            return Err("update_function must not be empty".to_string());
        }
        if self.event_table.trim().is_empty() {
            return Err("event_table must not be empty".to_string());
        }
        if !(self.delta_time > 0.0 && self.delta_time.is_finite()) {
            return Err("delta_time must be a positive number".to_string());
        }
        if LoggingUtils::level_from_str(&self.log_level).is_none() {
            return Err(format!("unknown log_level '{}'", self.log_level));
        }
        Ok(())
    }
}
