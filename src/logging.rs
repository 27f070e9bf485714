//! Structured logging for kmerstore
//!
//! Library code only emits `tracing` events and spans. Binaries call
//! [`LoggingSystem::init`] once to install a subscriber that writes either
//! human-readable or JSON lines to stderr through a non-blocking writer.

use crate::error::{KmerStoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt as tracing_fmt, layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log level configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = KmerStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(KmerStoreError::config(format!("Invalid log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level
    pub level: LogLevel,
    /// Emit one JSON object per event instead of plain text
    pub json_format: bool,
    /// Module-specific log levels, e.g. `kmerstore::store = "debug"`
    pub module_levels: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the event filter: `RUST_LOG` first, then the base level as the
    /// default, then the per-module levels on top.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .from_env_lossy();

        for (module, level) in &self.module_levels {
            let directive = format!("{}={}", module, level).parse().map_err(|e| {
                KmerStoreError::config(format!("Invalid log directive for {}: {}", module, e))
            })?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

/// Installed global subscriber. Keep it alive for the life of the program;
/// dropping it flushes buffered log lines.
pub struct LoggingSystem {
    config: LoggingConfig,
    _guard: WorkerGuard,
}

impl LoggingSystem {
    /// Install the global subscriber. Fails if one is already installed.
    pub fn init(config: LoggingConfig) -> Result<Self> {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

        let format_layer = if config.json_format {
            tracing_fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .boxed()
        } else {
            tracing_fmt::layer()
                .with_target(true)
                .with_writer(writer)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(format_layer.with_filter(config.env_filter()?))
            .try_init()
            .map_err(|e| KmerStoreError::config(format!("Failed to initialize logging: {}", e)))?;

        info!(config = ?config, "kmerstore logging initialized");

        Ok(Self {
            config,
            _guard: guard,
        })
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Run `f` and log how long it took under `name`.
    pub fn time_operation<T, F>(&self, name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let started = Instant::now();
        let result = f();
        info!(
            operation = name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "operation finished"
        );
        result
    }
}
