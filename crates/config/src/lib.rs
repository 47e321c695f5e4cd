//! Configuration loading, validation, and management for agentdesk.
//!
//! Loads configuration from `~/.agentdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Environment variables consulted for the provider API key, highest priority first.
pub const API_KEY_ENV_VARS: [&str; 2] = ["AGENTDESK_API_KEY", "GROQ_API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.agentdesk/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model used by every specialist agent unless overridden
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model used by the general chat agent
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Conversation context limits
    #[serde(default)]
    pub context: ContextConfig,

    /// Image handling
    #[serde(default)]
    pub vision: VisionConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Per-agent overrides, keyed by agent id
    #[serde(default)]
    pub agents: BTreeMap<String, AgentOverride>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_chat_model() -> String {
    "llama3-8b-8192".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
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
            .field("chat_model", &self.chat_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("context", &self.context)
            .field("vision", &self.vision)
            .field("providers", &self.providers)
            .field("agents", &self.agents)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allowed CORS origins; `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size. Inline images make requests large.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl GatewayConfig {
    /// Whether CORS should allow any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Prior turns kept in a transcript
    #[serde(default = "default_window_turns")]
    pub window_turns: usize,

    /// Per-turn content clip, in characters
    #[serde(default = "default_max_turn_chars")]
    pub max_turn_chars: usize,

    /// Whole-prompt cap, in characters
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Prior turns forwarded as native chat messages
    #[serde(default = "default_message_history_limit")]
    pub message_history_limit: usize,
}

fn default_window_turns() -> usize {
    5
}
fn default_max_turn_chars() -> usize {
    500
}
fn default_max_prompt_chars() -> usize {
    4000
}
fn default_message_history_limit() -> usize {
    10
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_turns: default_window_turns(),
            max_turn_chars: default_max_turn_chars(),
            max_prompt_chars: default_max_prompt_chars(),
            message_history_limit: default_message_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Vision-capable model used when a request carries images
    #[serde(default = "default_vision_model")]
    pub model: String,

    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Largest accepted base64 payload per image
    #[serde(default = "default_max_encoded_bytes")]
    pub max_encoded_bytes: usize,
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".into()
}
fn default_max_images() -> usize {
    5
}
fn default_max_encoded_bytes() -> usize {
    4 * 1024 * 1024
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: default_vision_model(),
            max_images: default_max_images(),
            max_encoded_bytes: default_max_encoded_bytes(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// HTTP timeout for a single completion call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Selective override of a built-in agent. Unset fields keep the built-in value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_capable: Option<bool>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentdesk/config.toml).
    ///
    /// Also checks environment variables:
    /// - `AGENTDESK_API_KEY`, then `GROQ_API_KEY` (only if no key is in the file)
    /// - `AGENTDESK_PROVIDER`, `AGENTDESK_MODEL`, `AGENTDESK_VISION_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
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

    /// Apply environment overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS.iter().find_map(|name| non_empty(name));
        }

        if let Some(provider) = non_empty("AGENTDESK_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = non_empty("AGENTDESK_MODEL") {
            self.default_model = model;
        }

        if let Some(model) = non_empty("AGENTDESK_VISION_MODEL") {
            self.vision.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentdesk")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.context.window_turns == 0 || self.context.message_history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "context.window_turns and context.message_history_limit must be > 0".into(),
            ));
        }

        if self.context.max_prompt_chars < self.context.max_turn_chars {
            return Err(ConfigError::ValidationError(
                "context.max_prompt_chars must be >= context.max_turn_chars".into(),
            ));
        }

        if self.vision.max_images == 0 {
            return Err(ConfigError::ValidationError(
                "vision.max_images must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The API key for the default provider, from provider config or the top level.
    pub fn resolved_api_key(&self) -> Option<&str> {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
            .or(self.api_key.as_deref().filter(|k| !k.trim().is_empty()))
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// The API key, or a fatal configuration error when none is set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.resolved_api_key().ok_or(ConfigError::MissingApiKey {
            provider: self.default_provider.clone(),
        })
    }

    /// First eight characters of the API key, for diagnostics.
    pub fn api_key_prefix(&self) -> Option<String> {
        self.resolved_api_key()
            .map(|key| format!("{}...", key.chars().take(8).collect::<String>()))
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
            chat_model: default_chat_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            context: ContextConfig::default(),
            vision: VisionConfig::default(),
            providers: HashMap::new(),
            agents: BTreeMap::new(),
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

    #[error("No API key for provider '{provider}': set GROQ_API_KEY (or AGENTDESK_API_KEY) or api_key in config.toml")]
    MissingApiKey { provider: String },
}
