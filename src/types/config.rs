//! Configuration for querycache.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{QueryCacheError, QueryCacheResult};

/// Main configuration for querycache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Query agent settings.
    #[serde(default)]
    pub agent: AgentConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// LRU cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached answers.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    4
}

/// Dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the clients JSON file.
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data.json")
}

/// How raw queries are turned into cache keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    /// Lowercase, strip punctuation, collapse whitespace.
    #[default]
    Text,
    /// Extract client, year and query kind from the known dataset entities.
    Entity,
}

/// Query agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Key normalizer.
    #[serde(default)]
    pub normalizer: NormalizerKind,

    /// Maximum number of answered queries kept in the history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerKind::default(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    100
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> QueryCacheResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> QueryCacheResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            dataset: DatasetConfig::default(),
            agent: AgentConfig::default(),
        }
    }

    /// Makes a relative dataset path relative to `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.dataset.path.is_relative() {
            self.dataset.path = base.join(&self.dataset.path);
        }
    }

    /// Rejects values the rest of the crate cannot work with.
    pub fn validate(&self) -> QueryCacheResult<()> {
        if self.cache.capacity == 0 {
            return Err(QueryCacheError::config("cache.capacity must be at least 1"));
        }

        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(QueryCacheError::config(format!(
                "general.log_format must be 'text' or 'json', got '{}'",
                self.general.log_format
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
