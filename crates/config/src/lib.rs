//! Configuration loading, validation, and management for Chainwright.
//!
//! Loads configuration from `~/.chainwright/config.toml`, then a `.env`
//! file if one is found, then environment variable overrides. Validates all
//! settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.chainwright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Named sequential pipelines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipelines: Vec<PipelineConfig>,

    /// Router table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_temperature() -> f32 {
    0.0
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("memory", &self.memory)
            .field("pipelines", &self.pipelines)
            .field("router", &self.router)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// Which retention strategy a conversation uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryStrategy {
    /// Keep every turn
    #[default]
    Buffer,
    /// Keep the last `window_size` turns
    Window,
    /// Keep turns while under `max_token_limit`
    Token,
    /// Like `Token`, but fold evicted turns into a running summary
    Summary,
}

impl std::str::FromStr for MemoryStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buffer" => Ok(MemoryStrategy::Buffer),
            "window" => Ok(MemoryStrategy::Window),
            "token" => Ok(MemoryStrategy::Token),
            "summary" => Ok(MemoryStrategy::Summary),
            other => Err(ConfigError::ValidationError(format!(
                "unknown memory strategy '{other}' (expected buffer, window, token or summary)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub strategy: MemoryStrategy,

    /// Turns kept by the window strategy
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Token ceiling for the token and summary strategies
    #[serde(default = "default_max_token_limit")]
    pub max_token_limit: usize,
}

fn default_window_size() -> usize {
    5
}
fn default_max_token_limit() -> usize {
    100
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            strategy: MemoryStrategy::default(),
            window_size: default_window_size(),
            max_token_limit: default_max_token_limit(),
        }
    }
}

/// A named sequential pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Unique pipeline name
    pub name: String,

    /// Keys the caller must supply
    pub inputs: Vec<String>,

    /// Keys returned to the caller
    pub outputs: Vec<String>,

    /// Steps, executed in order
    pub steps: Vec<StepConfig>,
}

/// One model call inside a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Prompt template with `{placeholders}`
    pub template: String,

    /// Key the model's reply is bound to
    pub output_key: String,

    /// Temperature override for this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Router table: named single-prompt destinations plus a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub destinations: Vec<DestinationConfig>,

    /// Template for the default destination; must use `{input}`
    #[serde(default = "default_router_template")]
    pub default_template: String,
}

fn default_router_template() -> String {
    "{input}".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub name: String,
    pub description: String,

    /// Prompt template; must use `{input}`
    pub template: String,
}

impl AppConfig {
    /// Load configuration from the default path (~/.chainwright/config.toml).
    ///
    /// Also reads a `.env` file (current directory or any parent) and checks
    /// environment variables for API keys:
    /// - `CHAINWRIGHT_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Environment variable overrides (highest priority).
    fn apply_env(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("CHAINWRIGHT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("CHAINWRIGHT_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("CHAINWRIGHT_MODEL") {
            self.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chainwright")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.memory.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window_size must be at least 1".into(),
            ));
        }

        if self.memory.max_token_limit == 0 {
            return Err(ConfigError::ValidationError(
                "memory.max_token_limit must be at least 1".into(),
            ));
        }

        for (i, pipeline) in self.pipelines.iter().enumerate() {
            if self.pipelines[..i].iter().any(|p| p.name == pipeline.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate pipeline name '{}'",
                    pipeline.name
                )));
            }
            for step in &pipeline.steps {
                if let Some(t) = step.temperature {
                    if !(0.0..=2.0).contains(&t) {
                        return Err(ConfigError::ValidationError(format!(
                            "pipeline '{}' step '{}': temperature must be between 0.0 and 2.0",
                            pipeline.name, step.output_key
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Look up a configured pipeline by name.
    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            providers: HashMap::new(),
            memory: MemoryConfig::default(),
            pipelines: vec![],
            router: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for chainwright_core::Error {
    fn from(e: ConfigError) -> Self {
        chainwright_core::Error::config(e.to_string())
    }
}
