//! Error types for lexchat
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for lexchat operations
///
/// Public store operations never surface these to the caller; they are used
/// internally (storage backends, configuration, backend client) and by the
/// CLI entry point.
#[derive(Error, Debug)]
pub enum LexchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Durable storage errors (open, read, write)
    #[error("Storage error: {0}")]
    Storage(String),

    /// A write was rejected because it would exceed the storage quota
    #[error("Storage quota exceeded for key '{key}': required={required} bytes, limit={limit} bytes")]
    QuotaExceeded {
        /// Key whose write was rejected
        key: String,
        /// Total bytes the store would hold after the write
        required: usize,
        /// Configured quota
        limit: usize,
    },

    /// Question-answering backend errors (non-success status, bad payload)
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LexchatError {
    /// Returns true when `err` wraps a [`LexchatError::QuotaExceeded`]
    pub fn is_quota_exceeded(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<LexchatError>(),
            Some(LexchatError::QuotaExceeded { .. })
        )
    }
}

/// Result type alias for lexchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
