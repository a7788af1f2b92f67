//! Configuration file support.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ace_abstraction::{Model, ModelParameters};
use ace_models::{ModelConfig, ModelFactory, ModelType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::ModelCallPolicy;
use crate::playbook::DEFAULT_SECTION;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AceConfig {
    /// Playbook file settings.
    #[serde(default)]
    pub playbook: PlaybookSection,
    /// Episode loop settings.
    #[serde(default)]
    pub episode: EpisodeSection,
    /// Model settings.
    #[serde(default)]
    pub model: ModelSection,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[playbook]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookSection {
    /// Backing JSON file.
    #[serde(default = "default_playbook_path")]
    pub path: PathBuf,
    /// Section ADD uses when no title is given.
    #[serde(default = "default_section")]
    pub default_section: String,
}

fn default_playbook_path() -> PathBuf {
    PathBuf::from("res/playbook.json")
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

impl Default for PlaybookSection {
    fn default() -> Self {
        Self { path: default_playbook_path(), default_section: default_section() }
    }
}

/// `[episode]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSection {
    /// Turn cap for the acting loop.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Episodes per run.
    #[serde(default = "default_episodes")]
    pub episodes: usize,
    /// Seed for the first episode; later episodes add their index.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_steps() -> usize {
    100
}

fn default_episodes() -> usize {
    1
}

impl Default for EpisodeSection {
    fn default() -> Self {
        Self { max_steps: default_max_steps(), episodes: default_episodes(), seed: None }
    }
}

/// `[model]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    /// "openai" or "mock".
    #[serde(default = "default_model_type")]
    pub model_type: String,
    /// Model identifier.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// API key; falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Budget per model call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after a failed call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model_type() -> String {
    "openai".to_string()
}

fn default_model_id() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_timeout_secs() -> u64 {
    120
}

const fn default_max_retries() -> u32 {
    2
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            model_type: default_model_type(),
            model_id: default_model_id(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl ModelSection {
    /// Builds the factory configuration.
    pub fn to_model_config(&self) -> Result<ModelConfig> {
        let model_type = ModelType::from_str(&self.model_type)
            .map_err(|e| ConfigError::InvalidValue(format!("model.model_type: {}", e)))?;
        let mut config = ModelConfig::new(model_type, self.model_id.clone());
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }

    /// Builds the configured model client.
    pub fn create_model(&self) -> Result<Arc<dyn Model>> {
        ModelFactory::create(self.to_model_config()?)
            .map_err(|e| ConfigError::InvalidValue(format!("model: {}", e)))
    }

    /// Sampling parameters for every role.
    pub fn parameters(&self) -> ModelParameters {
        ModelParameters { temperature: Some(self.temperature), ..ModelParameters::default() }
    }

    /// Timeout and retry policy; backoff grows by one second per retry.
    pub fn call_policy(&self) -> ModelCallPolicy {
        ModelCallPolicy::new(Duration::from_secs(self.timeout_secs), self.max_retries, Duration::from_secs(1))
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl AceConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load_from_file(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.episode.max_steps == 0 {
            return Err(ConfigError::InvalidValue("episode.max_steps must be greater than 0".to_string()));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("model.timeout_secs must be greater than 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::InvalidValue(format!(
                "model.temperature must be within 0..=2, got {}",
                self.model.temperature
            )));
        }
        ModelType::from_str(&self.model.model_type)
            .map_err(|e| ConfigError::InvalidValue(format!("model.model_type: {}", e)))?;
        Ok(())
    }
}
