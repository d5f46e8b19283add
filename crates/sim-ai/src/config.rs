//! Generator settings from the environment or a YAML file.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_MODEL: &str = "FRANCHISE_MODEL";
pub const ENV_BASE_URL: &str = "FRANCHISE_API_BASE";

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no API key: set ANTHROPIC_API_KEY or api_key in the config file")]
    MissingApiKey,
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

/// Connection and sampling settings for the hosted generator.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub scenario_max_tokens: u32,
    pub topics_max_tokens: u32,
    pub analysis_max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            scenario_max_tokens: 800,
            topics_max_tokens: 300,
            analysis_max_tokens: 400,
            temperature: 0.7,
            timeout_ms: 30_000,
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::default().with_overrides(|k| std::env::var(k).ok())
    }

    /// Parse YAML; any field may be omitted. The environment still fills in
    /// a missing API key and overrides model and base URL.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigurationError> {
        let cfg: GeneratorConfig = serde_yaml::from_str(text)?;
        cfg.with_overrides(|k| std::env::var(k).ok())
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Apply environment-style overrides from `lookup`, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            self.api_key = set(lookup(ENV_API_KEY));
        }
        if let Some(model) = set(lookup(ENV_MODEL)) {
            self.model = model;
        }
        if let Some(base) = set(lookup(ENV_BASE_URL)) {
            self.base_url = base;
        }
        self.validate()?;
        Ok(self)
    }

    /// The API key, or [`ConfigurationError::MissingApiKey`].
    pub fn api_key(&self) -> Result<&str, ConfigurationError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigurationError::MissingApiKey)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigurationError::Invalid {
                field: "temperature",
                reason: format!("{} is outside [0, 1]", self.temperature),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigurationError::Invalid {
                field: "model",
                reason: "empty".into(),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigurationError::Invalid {
                field: "base_url",
                reason: format!("{} is not an http(s) URL", self.base_url),
            });
        }
        for (field, v) in [
            ("scenario_max_tokens", self.scenario_max_tokens),
            ("topics_max_tokens", self.topics_max_tokens),
            ("analysis_max_tokens", self.analysis_max_tokens),
        ] {
            if v == 0 {
                return Err(ConfigurationError::Invalid {
                    field,
                    reason: "must be positive".into(),
                });
            }
        }
        Ok(())
    }
}
