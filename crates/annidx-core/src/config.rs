//! Layered configuration for an embedded index engine.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (reloptions passed at `build`/`options` time)
//! 2. Environment variables (`ANNIDX_*`)
//! 3. Configuration file (`annidx.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A value fell outside its documented range.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Dotted key path, e.g. `"hnsw.m"`.
        key: String,
        /// Human-readable explanation.
        message: String,
    },
}

/// `[hnsw]` configuration section (§6 reloptions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Bi-directional links per node (M). Default 16, range 2..=100.
    pub m: usize,
    /// Candidate list size during construction. Default 64, range 4..=1000.
    pub ef_construction: usize,
    /// Session-scoped candidate list size during search. Default 40, range 1..=1000.
    pub ef_search: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 64,
            ef_search: 40,
        }
    }
}

/// `[ivfflat]` configuration section (§6 reloptions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IvfflatConfig {
    /// Number of centroid lists. Default 100, range 1..=32768.
    pub lists: usize,
    /// Session-scoped number of lists probed per query. Default 1, range 1..=lists.
    pub probes: usize,
}

impl Default for IvfflatConfig {
    fn default() -> Self {
        Self {
            lists: 100,
            probes: 1,
        }
    }
}

/// `[storage]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Page size in bytes. Fixed at the host's page size; not independently
    /// tunable, present so it is visible in a dumped configuration.
    pub page_size: usize,
    /// Data directory for standalone (non-embedded) use.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: 8192,
            data_dir: "./annidx_data".to_string(),
        }
    }
}

/// `[build]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Requested parallel worker count for IVFFlat builds. 0 = host decides.
    pub parallel_workers: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 0,
        }
    }
}

/// `[logging]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnnidxConfig {
    /// HNSW reloptions and session parameters.
    pub hnsw: HnswConfig,
    /// IVFFlat reloptions and session parameters.
    pub ivfflat: IvfflatConfig,
    /// Page storage configuration.
    pub storage: StorageConfig,
    /// Build-time parallelism configuration.
    pub build: BuildConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AnnidxConfig {
    /// Loads configuration from `annidx.toml` in the current directory, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("annidx.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to parse.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("ANNIDX_").split("_").lowercase(false));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates static ranges from §3/§6. Cross-field constraints that need
    /// an open index (`probes <= lists`) are checked separately at scan time.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=100).contains(&self.hnsw.m) {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.m".to_string(),
                message: format!("value {} is out of range [2, 100]", self.hnsw.m),
            });
        }
        if !(4..=1000).contains(&self.hnsw.ef_construction) {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.ef_construction".to_string(),
                message: format!(
                    "value {} is out of range [4, 1000]",
                    self.hnsw.ef_construction
                ),
            });
        }
        if !(1..=1000).contains(&self.hnsw.ef_search) {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.ef_search".to_string(),
                message: format!("value {} is out of range [1, 1000]", self.hnsw.ef_search),
            });
        }
        if !(1..=32768).contains(&self.ivfflat.lists) {
            return Err(ConfigError::InvalidValue {
                key: "ivfflat.lists".to_string(),
                message: format!("value {} is out of range [1, 32768]", self.ivfflat.lists),
            });
        }
        if self.ivfflat.probes < 1 {
            return Err(ConfigError::InvalidValue {
                key: "ivfflat.probes".to_string(),
                message: "value must be >= 1".to_string(),
            });
        }
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }
        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
