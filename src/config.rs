//! Configuration loading and management for the intake tool.
//!
//! Loads settings from `intake.toml` with environment variable overrides for sensitive data.

use crate::validation::FieldRules;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "intake.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing API key: set GOOGLE_API_KEY or [api].google_api_key")]
    MissingApiKey,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Text generation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier (e.g., "gemini-2.5-pro")
    pub model: String,
    /// Base URL of the Gemini API
    pub base_url: String,
    pub temperature: f32,
    /// Thinking budget passed through to the model; -1 lets the model decide
    pub thinking_budget: i32,
    pub timeout_secs: u64,
    /// Retries after a transient failure (0 or 1)
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            temperature: 0.25,
            thinking_budget: -1,
            timeout_secs: 60,
            max_retries: 1,
            retry_delay_ms: 500,
        }
    }
}

/// API keys configuration (environment wins over the file)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default, deserialize_with = "secret_value")]
    pub google_api_key: Option<SecretString>,
}

fn secret_value<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(SecretString::from))
}

/// Where persisted requests are written
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub validation: FieldRules,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location (intake.toml in cwd or home).
    ///
    /// Falls back to built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::parse_file(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        config.check()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        config.check()?;
        Ok(config)
    }

    /// Parse configuration text without consulting the environment
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        let key = std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Some(key) = key {
            self.api.google_api_key = Some(SecretString::from(key));
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::Invalid(format!(
                "agent.temperature {} is outside 0.0..=2.0",
                self.agent.temperature
            )));
        }
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "agent.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.agent.max_retries > 1 {
            return Err(ConfigError::Invalid(format!(
                "agent.max_retries {} exceeds the single retry allowed",
                self.agent.max_retries
            )));
        }
        Ok(())
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("intake")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Get the API key, failing early when none was configured
    pub fn api_key(&self) -> Result<&SecretString, ConfigError> {
        self.api
            .google_api_key
            .as_ref()
            .ok_or(ConfigError::MissingApiKey)
    }
}
