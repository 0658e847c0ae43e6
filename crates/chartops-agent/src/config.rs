//! Agent configuration

use chartops_core::{ChartOperationCommand, QueryCatalog};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "phi3.5:latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 100;

pub const ENV_BASE_URL: &str = "CHARTOPS_BASE_URL";
pub const ENV_MODEL: &str = "CHARTOPS_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "CHARTOPS_TIMEOUT_SECS";

/// Main agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Generation service root, without trailing slash
    pub base_url: String,

    /// Model name passed with every request
    pub model: String,

    /// Upper bound on a single generation call
    pub timeout_secs: u64,

    /// Query catalog file replacing the built-in one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Sampling for chart command generation
    pub chart: GenerationSettings,

    /// Sampling for query identifier mapping
    pub insights: GenerationSettings,

    /// Returned when the generation service is unreachable.
    /// Never applied to recovery failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_command: Option<ChartOperationCommand>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            catalog_path: None,
            chart: GenerationSettings::chart(),
            insights: GenerationSettings::insights(),
            fallback_command: None,
        }
    }
}

impl AgentConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_fallback_command(mut self, command: ChartOperationCommand) -> Self {
        self.fallback_command = Some(command);
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `CHARTOPS_*` variables, reading `.env` first if present
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; blank values are ignored
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.model = model;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
        }

        Ok(self)
    }

    /// The configured catalog, or the built-in one
    pub fn load_catalog(&self) -> Result<QueryCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => Ok(QueryCatalog::from_file(path)?),
            None => Ok(QueryCatalog::terminal_analytics()),
        }
    }
}

/// Sampling parameters sent with a generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl GenerationSettings {
    pub fn chart() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 500,
        }
    }

    /// Only a single identifier is expected back
    pub fn insights() -> Self {
        Self {
            max_tokens: 100,
            ..Self::chart()
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::chart()
    }
}
