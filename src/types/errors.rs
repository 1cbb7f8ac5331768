//! Error types for querycache.

use thiserror::Error;

use crate::cache::CacheError;

/// Default result type for querycache.
pub type QueryCacheResult<T> = Result<T, QueryCacheError>;

/// Errors that can occur in querycache.
#[derive(Error, Debug)]
pub enum QueryCacheError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("{0}")]
    Other(String),
}

impl QueryCacheError {
    /// Creates a generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        Self::Dataset(msg.into())
    }
}
