//! Configuration management for lexchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{LexchatError, Result};
use crate::store::CachePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for lexchat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Question-answering backend settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Durable storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Conversation index and message cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the question-answering API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// SQLite file in the user's data directory
    #[default]
    Sqlite,
    /// In-process only; nothing survives the process
    Memory,
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: StorageBackend,

    /// Explicit SQLite database path (defaults to the user data directory)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum bytes the storage may hold, mirroring browser storage limits
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: Option<usize>,
}

fn default_quota_bytes() -> Option<usize> {
    Some(5 * 1024 * 1024) // 5 MiB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            quota_bytes: default_quota_bytes(),
        }
    }
}

/// Conversation index and message cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of sessions whose messages are cached
    #[serde(default = "default_max_cached_sessions")]
    pub max_cached_sessions: usize,

    /// Sessions kept when retrying a write rejected for capacity
    #[serde(default = "default_quota_retry_sessions")]
    pub quota_retry_sessions: usize,

    /// Storage key of the conversation index
    #[serde(default = "default_conversations_key")]
    pub conversations_key: String,

    /// Storage key of the message cache
    #[serde(default = "default_messages_key")]
    pub messages_key: String,
}

fn default_max_cached_sessions() -> usize {
    10
}

fn default_quota_retry_sessions() -> usize {
    10
}

fn default_conversations_key() -> String {
    "lexchat.conversations".to_string()
}

fn default_messages_key() -> String {
    "lexchat.messages".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cached_sessions: default_max_cached_sessions(),
            quota_retry_sessions: default_quota_retry_sessions(),
            conversations_key: default_conversations_key(),
            messages_key: default_messages_key(),
        }
    }
}

impl CacheConfig {
    /// Eviction limits for the message cache
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            max_sessions: self.max_cached_sessions,
            retry_sessions: self.quota_retry_sessions,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (e.g. "info", "lexchat=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LexchatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| LexchatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("LEXCHAT_BACKEND_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("LEXCHAT_BACKEND_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid LEXCHAT_BACKEND_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(backend) = std::env::var("LEXCHAT_STORAGE_BACKEND") {
            self.storage.backend = match backend.to_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "memory" => StorageBackend::Memory,
                _ => {
                    tracing::warn!("Invalid storage backend: {}, using default", backend);
                    StorageBackend::default()
                }
            };
        }

        if let Ok(quota) = std::env::var("LEXCHAT_STORAGE_QUOTA_BYTES") {
            match quota.parse::<usize>() {
                Ok(0) => self.storage.quota_bytes = None,
                Ok(value) => self.storage.quota_bytes = Some(value),
                Err(_) => tracing::warn!("Invalid LEXCHAT_STORAGE_QUOTA_BYTES: {}", quota),
            }
        }

        if let Ok(max) = std::env::var("LEXCHAT_MAX_CACHED_SESSIONS") {
            if let Ok(value) = max.parse() {
                self.cache.max_cached_sessions = value;
            } else {
                tracing::warn!("Invalid LEXCHAT_MAX_CACHED_SESSIONS: {}", max);
            }
        }

        if let Ok(level) = std::env::var("LEXCHAT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json) = std::env::var("LEXCHAT_LOG_JSON") {
            self.logging.json = matches!(json.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }

        if let Some(path) = &cli.storage_path {
            self.storage.backend = StorageBackend::Sqlite;
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(LexchatError::Config("backend.base_url cannot be empty".to_string()).into());
        }

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LexchatError::Config(format!(
                "backend.base_url must start with http:// or https://: {}",
                base_url
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(LexchatError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.max_cached_sessions == 0 {
            return Err(LexchatError::Config(
                "cache.max_cached_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cache.quota_retry_sessions == 0
            || self.cache.quota_retry_sessions > self.cache.max_cached_sessions
        {
            return Err(LexchatError::Config(format!(
                "cache.quota_retry_sessions must be between 1 and {}",
                self.cache.max_cached_sessions
            ))
            .into());
        }

        if self.cache.conversations_key.is_empty() || self.cache.messages_key.is_empty() {
            return Err(
                LexchatError::Config("cache storage keys cannot be empty".to_string()).into(),
            );
        }

        if self.cache.conversations_key == self.cache.messages_key {
            return Err(LexchatError::Config(
                "cache.conversations_key and cache.messages_key must differ".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
