//! Configuration loading and validation for trajmod.
//!
//! Loads configuration from `~/.trajmod/config.toml` (or an explicit path)
//! with environment variable overrides. Command-line flags are applied on top
//! by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.trajmod/config.toml`. Every key is optional.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential; `EMPTY` is sent when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name; required at call time if not set here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Prompt template path
    #[serde(default = "default_prompt")]
    pub prompt: PathBuf,

    /// Sampling temperature; endpoint default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max tokens for the judgment; endpoint default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Placeholder credential understood by local OpenAI-compatible servers.
pub const DEFAULT_API_KEY: &str = "EMPTY";

fn default_base_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_prompt() -> PathBuf {
    PathBuf::from("prompts/trajectory_binary.txt")
}
fn default_timeout_secs() -> u64 {
    120
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
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("prompt", &self.prompt)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the default location when `None`,
    /// then apply environment overrides:
    /// - `TRAJMOD_API_KEY`, then `OPENAI_API_KEY`
    /// - `TRAJMOD_BASE_URL`, then `OPENAI_BASE_URL`
    /// - `TRAJMOD_MODEL`
    ///
    /// Not validated: callers apply their own overrides, then [`Self::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_dir().join("config.toml"),
        };
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a specific file path, without validating.
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

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("TRAJMOD_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(url) = non_empty("TRAJMOD_BASE_URL").or_else(|| non_empty("OPENAI_BASE_URL")) {
            self.base_url = url;
        }
        if let Some(model) = non_empty("TRAJMOD_MODEL") {
            self.model = Some(model);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".trajmod")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 2.0".into(),
                ));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("timeout_secs must be > 0".into()));
        }

        Ok(())
    }

    /// The credential to send, falling back to [`DEFAULT_API_KEY`].
    pub fn api_key_or_default(&self) -> &str {
        self.api_key.as_deref().unwrap_or(DEFAULT_API_KEY)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: None,
            prompt: default_prompt(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
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
