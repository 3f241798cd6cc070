use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::translation::pacing::PacingPolicy;

/// Application configuration module
/// This module handles the service configuration including loading,
/// environment overrides and validation.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote completion service settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Request pacing for multi-unit documents
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Base URL of the OpenAI-compatible API (e.g. "http://localhost:23333/v1")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key sent as bearer token
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature parameter for text generation
    /// Lower values make output more deterministic
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output length cap per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// System prompt sent with every request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// User prompt template
    /// Placeholders: {target_language}, {text}
    #[serde(default = "default_user_prompt")]
    pub user_prompt: String,

    /// Retry count for failed requests (0 disables retries)
    #[serde(default)]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Delays inserted between remote calls while translating a document
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PacingConfig {
    /// Delay before every translation call, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Number of successful units between extra pauses (0 disables)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Extra pause after each batch, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_delay_ms(),
        }
    }
}

impl PacingConfig {
    /// Convert to the policy used by the orchestration loop
    pub fn policy(&self) -> PacingPolicy {
        PacingPolicy::new(
            Duration::from_millis(self.delay_ms),
            self.batch_size,
            Duration::from_millis(self.batch_delay_ms),
        )
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map onto the `log` crate's filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Largest accepted `translation.retry_count`
pub const MAX_RETRY_COUNT: u32 = 10;

/// Environment variable holding the completion service base URL
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";

/// Environment variable holding the completion service API key
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8989
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key() -> String {
    // Local OpenAI-compatible servers accept any key
    "no-key".to_string()
}

fn default_model() -> String {
    "internlm2.5-chat".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    10
}

fn default_system_prompt() -> String {
    "You are a professional translation assistant. Provide the translation directly, without any explanation or additional content.".to_string()
}

fn default_user_prompt() -> String {
    "Translate the following text into {target_language}. Return only the translation and nothing else:\n\n{text}".to_string()
}

impl Config {
    /// Load the configuration file if it exists, falling back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("Config file not found at '{}', using defaults.", path.display());
            return Ok(Self::default());
        }

        let file = File::open(path)
            .context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.translation.endpoint = base_url.trim().to_string();
        }

        if let Some(api_key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.translation.api_key = api_key.trim().to_string();
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.translation.endpoint)
            .map_err(|e| anyhow!("Invalid translation endpoint '{}': {}", self.translation.endpoint, e))?;

        if self.translation.model.trim().is_empty() {
            return Err(anyhow!("Translation model must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.translation.temperature) {
            return Err(anyhow!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.translation.temperature
            ));
        }

        if self.translation.retry_count > MAX_RETRY_COUNT {
            return Err(anyhow!(
                "retry_count must be at most {}, got {}",
                MAX_RETRY_COUNT,
                self.translation.retry_count
            ));
        }

        if self.translation.max_tokens == 0 {
            return Err(anyhow!("max_tokens must be greater than zero"));
        }

        Ok(())
    }
}
