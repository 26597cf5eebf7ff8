// src/error.rs

//! Unified error handling for the repository differ.

use std::fmt;

use thiserror::Error;

/// Result type alias for repodiff operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Repository XML could not be parsed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Metadata for one feed could not be fetched or parsed
    #[error("Metadata load failed for {url}: {message}")]
    MetadataLoad { url: String, message: String },

    /// A package record violates the loader contract
    #[error("Malformed record {identity}: missing {field}")]
    MalformedRecord { identity: String, field: &'static str },

    /// Cache backend failure (never surfaced past the cache layer)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a metadata load error for a feed URL.
    pub fn metadata_load(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MetadataLoad {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed record error.
    pub fn malformed(identity: impl Into<String>, field: &'static str) -> Self {
        Self::MalformedRecord {
            identity: identity.into(),
            field,
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl fmt::Display) -> Self {
        Self::Cache(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
