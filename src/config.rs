//! Configuration management for kmerstore
//!
//! Settings come from defaults, an optional `.toml`/`.json`/`.yaml` file
//! and `KMERSTORE_*` environment variables, in that order. Every source is
//! validated before it is accepted.

use crate::error::{KmerStoreError, Result};
use crate::logging::{LogLevel, LoggingConfig};
use crate::store::DEFAULT_LOAD_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use validator::Validate;

/// Default k-mer length
pub const DEFAULT_K: usize = 12;

/// Main configuration structure for kmerstore
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct KmerStoreConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Index settings
    #[validate(nested)]
    pub index: IndexSettings,
}

/// Index building settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IndexSettings {
    /// K-mer length
    #[validate(range(min = 2, max = 32))]
    pub k: usize,

    /// Windows buffered by `load` before they are merged into the index
    #[validate(range(min = 1, max = 100000000))]
    pub load_batch_size: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
        }
    }
}

#[derive(Clone, Copy)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(KmerStoreError::config(
                "Unsupported config file format. Use .toml, .yaml, .yml, or .json",
            )),
        }
    }
}

/// Loads, overrides, validates and saves a [`KmerStoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: KmerStoreConfig,
}

impl ConfigManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: KmerStoreConfig = match format {
            ConfigFormat::Toml => toml::from_str(&content)
                .map_err(|e| KmerStoreError::config(format!("TOML parse error: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::from_str(&content)
                .map_err(|e| KmerStoreError::config(format!("YAML parse error: {}", e)))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| KmerStoreError::config(format!("JSON parse error: {}", e)))?,
        };

        let manager = Self { config };
        manager.validate()?;
        Ok(manager)
    }

    /// Override settings from `KMERSTORE_*` environment variables
    pub fn load_from_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Override settings from any key lookup using the environment variable
    /// names: `KMERSTORE_K`, `KMERSTORE_BATCH_SIZE`, `KMERSTORE_LOG_LEVEL`
    /// and `KMERSTORE_JSON_LOGS`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(k) = lookup("KMERSTORE_K") {
            self.config.index.k = k
                .parse()
                .map_err(|e| KmerStoreError::parse(format!("Invalid KMERSTORE_K: {}", e)))?;
        }

        if let Some(batch) = lookup("KMERSTORE_BATCH_SIZE") {
            self.config.index.load_batch_size = batch.parse().map_err(|e| {
                KmerStoreError::parse(format!("Invalid KMERSTORE_BATCH_SIZE: {}", e))
            })?;
        }

        if let Some(level) = lookup("KMERSTORE_LOG_LEVEL") {
            self.config.logging.level = level.parse::<LogLevel>()?;
        }

        if let Some(json_logs) = lookup("KMERSTORE_JSON_LOGS") {
            self.config.logging.json_format = json_logs.parse().map_err(|e| {
                KmerStoreError::parse(format!("Invalid KMERSTORE_JSON_LOGS: {}", e))
            })?;
        }

        self.validate()
    }

    /// Check the current configuration against its declared ranges
    pub fn validate(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| KmerStoreError::config(format!("Configuration validation failed: {}", e)))
    }

    /// Get current configuration
    pub fn config(&self) -> &KmerStoreConfig {
        &self.config
    }

    /// Get mutable configuration
    pub fn config_mut(&mut self) -> &mut KmerStoreConfig {
        &mut self.config
    }

    /// Save current configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(&self.config)
                .map_err(|e| KmerStoreError::config(format!("TOML serialize error: {}", e)))?,
            ConfigFormat::Yaml => serde_yaml::to_string(&self.config)
                .map_err(|e| KmerStoreError::config(format!("YAML serialize error: {}", e)))?,
            ConfigFormat::Json => serde_json::to_string_pretty(&self.config)
                .map_err(|e| KmerStoreError::config(format!("JSON serialize error: {}", e)))?,
        };

        std::fs::write(path, content)?;
        Ok(())
    }
}
