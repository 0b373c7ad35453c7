//! Configuration management for ollamastream
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.ollamastream/config.toml
//!
//! The `OLLAMA_HOST` and `OLLAMA_MODEL` environment variables override
//! whatever the file says.

use crate::errors::{ClientError, Result};
use crate::policy::{retry, Deadline, RetryPolicy};
use crate::streaming::DEFAULT_OLLAMA_URL;
use crate::types::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default chat model
pub const DEFAULT_MODEL: &str = "llama3.1:8b-instruct-q4_1";

/// Default output cap for structured-JSON requests
pub const DEFAULT_JSON_MAX_TOKENS: u32 = 200;

/// Client configuration, threaded into each client at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the Ollama server
    pub host: String,

    /// Model identifier
    pub model: String,

    /// Wall-clock limit for one logical chat call
    pub deadline_ms: u64,

    /// Output cap for structured-JSON requests
    pub json_max_tokens: u32,

    pub retry: RetryConfig,

    /// Generation options merged into every request (temperature, ...)
    pub options: GenerationOptions,
}

/// Retry behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            deadline_ms: crate::policy::DEFAULT_DEADLINE.as_millis() as u64,
            json_max_tokens: DEFAULT_JSON_MAX_TOKENS,
            retry: RetryConfig::default(),
            options: GenerationOptions::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: retry::BASE_DELAY_MS,
            max_delay_ms: retry::MAX_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from file or use defaults, then apply the
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Self::load_default()?,
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: ClientConfig = toml::from_str(&contents)
            .map_err(|e| ClientError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(ClientConfig::default())
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ollamastream").join("config.toml"))
    }

    /// Override host and model from `OLLAMA_HOST` / `OLLAMA_MODEL`
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            let host = host.trim();
            // Ollama itself accepts a bare `host:port`
            self.host = if host.contains("://") {
                host.to_string()
            } else {
                format!("http://{}", host)
            };
        }
        if let Some(model) = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "host must be an http(s) URL, got '{}'",
                self.host
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "model must not be empty".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ClientError::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.deadline_ms == 0 {
            return Err(ClientError::ConfigError(
                "deadline_ms must be greater than 0".to_string(),
            ));
        }

        if self.json_max_tokens == 0 {
            return Err(ClientError::ConfigError(
                "json_max_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ClientError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClientError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = deadline.as_millis() as u64;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay_ms: u64) -> Self {
        self.retry.max_attempts = max_attempts;
        self.retry.base_delay_ms = base_delay_ms;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_config(
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.retry.max_delay_ms,
        )
    }

    pub fn deadline(&self) -> Deadline {
        Deadline::new(Duration::from_millis(self.deadline_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "http://127.0.0.1:11434");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.deadline(), Deadline::new(Duration::from_secs(80)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_host() {
        let config = ClientConfig::default().with_host("127.0.0.1:11434");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_attempts() {
        let config = ClientConfig::default().with_retry(0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_deadline() {
        let config = ClientConfig::default().with_deadline(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let config = ClientConfig::default().with_model("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_overrides(|key| match key {
            "OLLAMA_HOST" => Some("10.0.0.5:11434".to_string()),
            "OLLAMA_MODEL" => Some("qwen2.5:7b".to_string()),
            _ => None,
        });
        assert_eq!(config.host, "http://10.0.0.5:11434");
        assert_eq!(config.model, "qwen2.5:7b");

        config.apply_overrides(|key| match key {
            "OLLAMA_HOST" => Some("https://ollama.internal".to_string()),
            _ => None,
        });
        assert_eq!(config.host, "https://ollama.internal");
        assert_eq!(config.model, "qwen2.5:7b");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            model = "mistral"

            [options]
            temperature = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.model, "mistral");
        assert_eq!(config.host, DEFAULT_OLLAMA_URL);
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.options["temperature"], json!(0.1));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ClientConfig::default()
            .with_model("llama3.2")
            .with_deadline(Duration::from_secs(5))
            .with_option("temperature", json!(0.7));
        config.save(&path).unwrap();

        let loaded = ClientConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "retry = \"three\"").unwrap();

        assert!(matches!(
            ClientConfig::load_from_file(&path),
            Err(ClientError::ConfigError(_))
        ));
    }
}
