//! Configuration loading, validation, and management for pagecraft.
//!
//! Loads configuration from `~/.pagecraft/config.toml` with environment
//! variable overrides. Validates all settings before the agent runs.

use pagecraft_core::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The root configuration structure.
///
/// Maps directly to `~/.pagecraft/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completions API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Script storage settings
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Settings for the agent loop and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum LLM/tool iterations per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How long a permission prompt may stay unanswered before auto-deny
    #[serde(default = "default_permission_timeout_secs")]
    pub permission_timeout_secs: u64,

    /// How long a terminal session is retained before the sweep removes it
    #[serde(default = "default_session_retention_secs")]
    pub session_retention_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            permission_timeout_secs: default_permission_timeout_secs(),
            session_retention_secs: default_session_retention_secs(),
        }
    }
}

/// Where persisted scripts live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Path to the script store file. None = in-memory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts_path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { scripts_path: None }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_iterations() -> u32 {
    10
}
fn default_permission_timeout_secs() -> u64 {
    300
}
fn default_session_retention_secs() -> u64 {
    3600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            agent: AgentSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

/// Redact the key for Debug output — config gets logged.
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
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("storage", &self.storage)
            .finish()
    }
}

impl AppConfig {
    /// Default config file path: `~/.pagecraft/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".pagecraft").join("config.toml")
    }

    /// Load from the default path, falling back to defaults when the file
    /// does not exist, then apply environment overrides.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
                message: format!("Cannot read {}: {e}", path.display()),
            })?;
            toml::from_str(&raw).map_err(|e| Error::Config {
                message: format!("Invalid config at {}: {e}", path.display()),
            })?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("PAGECRAFT_API_KEY")
            && !key.is_empty()
        {
            self.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("PAGECRAFT_MODEL")
            && !model.is_empty()
        {
            self.model = model;
        }
        if let Ok(url) = std::env::var("PAGECRAFT_BASE_URL")
            && !url.is_empty()
        {
            self.base_url = url;
        }
    }

    /// Reject settings the agent cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.model.trim().is_empty() {
            return Err(Error::Config {
                message: "model must not be empty".into(),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config {
                message: format!("base_url must be an http(s) URL, got '{}'", self.base_url),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config {
                message: format!("temperature must be in [0.0, 2.0], got {}", self.temperature),
            });
        }
        if self.agent.max_iterations == 0 {
            return Err(Error::Config {
                message: "agent.max_iterations must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Whether a completions credential is present.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}
