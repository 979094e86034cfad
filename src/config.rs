//! Configuration management for outcome-sessions.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::session::{
    StoreConfig, DEFAULT_LOG_PATH, DEFAULT_RECLAIM_INTERVAL, MAX_RECLAIM_INTERVAL,
};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session store configuration.
    pub store: StoreSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Session store configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Durable snapshot file.
    pub log_path: PathBuf,
    /// Seconds between reclamation passes.
    pub reclaim_interval_secs: u64,
    /// Rewrite the snapshot after a pass that removed entries.
    pub persist_on_reclaim: bool,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            reclaim_interval_secs: DEFAULT_RECLAIM_INTERVAL.as_secs(),
            persist_on_reclaim: true,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("OUTCOME_SESSIONS_LOG_PATH") {
            if !path.is_empty() {
                self.store.log_path = PathBuf::from(path);
            }
        }

        if let Ok(secs) = std::env::var("OUTCOME_SESSIONS_RECLAIM_SECS") {
            if let Ok(secs) = secs.parse() {
                self.store.reclaim_interval_secs = secs;
            }
        }

        if let Ok(level) = std::env::var("OUTCOME_SESSIONS_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(ref path) = args.log_file {
            self.store.log_path = path.clone();
        }

        if let Some(secs) = args.reclaim_interval_secs {
            self.store.reclaim_interval_secs = secs;
        }

        if args.no_persist_on_reclaim {
            self.store.persist_on_reclaim = false;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.apply_args(args);

        Ok(config)
    }

    /// Convert to the settings the session store is opened with.
    pub fn to_store_config(&self) -> Result<StoreConfig, ConfigError> {
        if self.store.reclaim_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.store.reclaim_interval_secs > MAX_RECLAIM_INTERVAL.as_secs() {
            return Err(ConfigError::IntervalTooLarge(self.store.reclaim_interval_secs));
        }
        if self.store.log_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogPath);
        }

        let mut config = StoreConfig::new(&self.store.log_path)
            .with_reclaim_interval(Duration::from_secs(self.store.reclaim_interval_secs));
        if !self.store.persist_on_reclaim {
            config = config.without_persist_on_reclaim();
        }

        Ok(config)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Reclamation interval of zero seconds.
    InvalidInterval,
    /// Reclamation interval above the supported maximum.
    IntervalTooLarge(u64),
    /// Durable log path is empty.
    EmptyLogPath,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidInterval => write!(f, "reclaim interval must be at least one second"),
            Self::IntervalTooLarge(secs) => write!(
                f,
                "reclaim interval of {} seconds exceeds the maximum of {}",
                secs,
                MAX_RECLAIM_INTERVAL.as_secs()
            ),
            Self::EmptyLogPath => write!(f, "durable log path must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::SessionStoreError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
