//! Configuration loading, validation, and management for Samovar.
//!
//! Loads configuration from `~/.samovar/config.toml` with environment
//! variable overrides, then validates at startup. Tool availability is a
//! pure function of the resulting struct — a missing optional credential
//! silently omits the tool it gates, it never fails startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps to `~/.samovar/config.toml`; every field has an environment
/// override (see `apply_env_overrides`).
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion model to target (required)
    #[serde(default)]
    pub model: String,

    /// Completion provider API key (required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Completion provider base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Conversation token budget for eviction (required)
    #[serde(default)]
    pub max_history_tokens: u64,

    /// Bound on provider/tool ping-pong per inbound message
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,

    /// Bing Web Search credential — enables the search tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_api_key: Option<String>,

    /// Hugging Face inference credential — enables context reduction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_api_key: Option<String>,

    /// Embeddings model id — enables the notes tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<String>,

    /// Persistence backend address (required), e.g. "sqlite://samovar.db"
    #[serde(default)]
    pub database_url: String,

    /// Note store location (JSONL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_path: Option<PathBuf>,

    /// Slack bot token (xoxb-...) for the Web API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_bot_token: Option<String>,

    /// Slack app-level token (xapp-...) for Socket Mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack_app_token: Option<String>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}

fn default_max_tool_iterations() -> u32 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            api_key: None,
            api_base: default_api_base(),
            max_history_tokens: 0,
            max_tool_iterations: default_max_tool_iterations(),
            search_api_key: None,
            classifier_api_key: None,
            embeddings_model: None,
            database_url: String::new(),
            notes_path: None,
            slack_bot_token: None,
            slack_app_token: None,
        }
    }
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
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("max_history_tokens", &self.max_history_tokens)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("search_api_key", &redact(&self.search_api_key))
            .field("classifier_api_key", &redact(&self.classifier_api_key))
            .field("embeddings_model", &self.embeddings_model)
            .field("database_url", &self.database_url)
            .field("notes_path", &self.notes_path)
            .field("slack_bot_token", &redact(&self.slack_bot_token))
            .field("slack_app_token", &redact(&self.slack_app_token))
            .finish()
    }
}

impl AppConfig {
    /// Default config file location: `~/.samovar/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".samovar").join("config.toml")
    }

    /// Load from the default location (file optional), apply environment
    /// overrides, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::from_file(&Self::default_path()) {
            Ok(c) => c,
            Err(ConfigError::Io { .. }) => {
                tracing::debug!("No config file found, using environment only");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides (highest priority).
    ///
    /// Prefixed `SAMOVAR_*` names win; well-known unprefixed names
    /// (`LLM_MODEL`, `MAX_TOKENS`, `OPENAI_API_KEY`, `BING_API_KEY`,
    /// `HUGGINGFACE_API_KEY`, `DATABASE_URL`, `SLACK_*_TOKEN`) are accepted
    /// as fallbacks.
    pub fn apply_env_overrides(&mut self) {
        let var = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .find_map(|n| std::env::var(n).ok())
                .filter(|v| !v.is_empty())
        };

        if let Some(model) = var(&["SAMOVAR_MODEL", "LLM_MODEL"]) {
            self.model = model;
        }
        if let Some(key) = var(&["SAMOVAR_API_KEY", "OPENAI_API_KEY"]) {
            self.api_key = Some(key);
        }
        if let Some(base) = var(&["SAMOVAR_API_BASE"]) {
            self.api_base = base;
        }
        if let Some(budget) = var(&["SAMOVAR_MAX_TOKENS", "MAX_TOKENS"]) {
            if let Ok(parsed) = budget.parse() {
                self.max_history_tokens = parsed;
            }
        }
        if let Some(iters) = var(&["SAMOVAR_MAX_TOOL_ITERATIONS"]) {
            if let Ok(parsed) = iters.parse() {
                self.max_tool_iterations = parsed;
            }
        }
        if let Some(key) = var(&["SAMOVAR_SEARCH_API_KEY", "BING_API_KEY"]) {
            self.search_api_key = Some(key);
        }
        if let Some(key) = var(&["SAMOVAR_CLASSIFIER_API_KEY", "HUGGINGFACE_API_KEY"]) {
            self.classifier_api_key = Some(key);
        }
        if let Some(model) = var(&["SAMOVAR_EMBEDDINGS_MODEL"]) {
            self.embeddings_model = Some(model);
        }
        if let Some(url) = var(&["SAMOVAR_DATABASE_URL", "DATABASE_URL"]) {
            self.database_url = url;
        }
        if let Some(path) = var(&["SAMOVAR_NOTES_PATH"]) {
            self.notes_path = Some(PathBuf::from(path));
        }
        if let Some(token) = var(&["SLACK_BOT_TOKEN"]) {
            self.slack_bot_token = Some(token);
        }
        if let Some(token) = var(&["SLACK_APP_TOKEN"]) {
            self.slack_app_token = Some(token);
        }
    }

    /// Validate required settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.is_empty() {
            return Err(ConfigError::Invalid(
                "model is required (SAMOVAR_MODEL / LLM_MODEL)".into(),
            ));
        }
        if self.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::Invalid(
                "api_key is required (SAMOVAR_API_KEY / OPENAI_API_KEY)".into(),
            ));
        }
        if self.max_history_tokens == 0 {
            return Err(ConfigError::Invalid(
                "max_history_tokens is required and must be > 0 (SAMOVAR_MAX_TOKENS / MAX_TOKENS)"
                    .into(),
            ));
        }
        if self.max_tool_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_tool_iterations must be > 0".into(),
            ));
        }
        if self.database_url.is_empty() {
            return Err(ConfigError::Invalid(
                "database_url is required (SAMOVAR_DATABASE_URL / DATABASE_URL)".into(),
            ));
        }
        Ok(())
    }

    /// Default note-store path: `~/.samovar/notes.jsonl`.
    pub fn notes_path(&self) -> PathBuf {
        self.notes_path.clone().unwrap_or_else(|| {
            Self::default_path()
                .parent()
                .map(|p| p.join("notes.jsonl"))
                .unwrap_or_else(|| PathBuf::from("notes.jsonl"))
        })
    }

    /// Whether Slack credentials are complete enough to run the bridge.
    pub fn slack_ready(&self) -> bool {
        self.slack_bot_token.as_deref().unwrap_or("") != ""
            && self.slack_app_token.as_deref().unwrap_or("") != ""
    }
}
