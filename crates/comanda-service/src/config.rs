//! # Service Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COMANDA_DB_PATH=/var/lib/comanda/comanda.db                        │
//! │     COMANDA_MAX_CONNECTIONS=8                                          │
//! │     COMANDA_MAX_RETRIES=5                                              │
//! │     COMANDA_UTC_OFFSET_MINUTES=-180                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/comanda-engine/comanda.toml (Linux)                      │
//! │     ~/Library/Application Support/com.comanda.engine/comanda.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # comanda.toml
//! [database]
//! path = "/var/lib/comanda/comanda.db"
//! max_connections = 5
//!
//! [engine]
//! max_conflict_retries = 3
//! utc_offset_minutes = -180   # omit to use the host timezone
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use comanda_core::SystemClock;
use comanda_db::DbConfig;

use crate::service::DEFAULT_MAX_CONFLICT_RETRIES;

/// Largest accepted UTC offset, in minutes (just under a day).
const MAX_OFFSET_MINUTES: i32 = 24 * 60 - 1;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; created if missing.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "comanda", "engine")
        .map(|dirs| dirs.data_dir().join("comanda.db"))
        .unwrap_or_else(|| PathBuf::from("./comanda.db"))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Reloads after a version conflict before reporting `conflict`.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Offset of the store's calendar, minutes east of UTC.
    /// `None` uses the host timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_max_conflict_retries() -> u32 {
    DEFAULT_MAX_CONFLICT_RETRIES
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            max_conflict_retries: default_max_conflict_retries(),
            utc_offset_minutes: None,
        }
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

/// Complete configuration for a [`ComandaService`](crate::ComandaService).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineSettings,
}

impl ServiceConfig {
    /// Loads configuration: defaults, then the TOML file (explicit path or
    /// the platform config dir), then environment overrides.
    ///
    /// ## Errors
    /// - `ConfigError::Io` / `ConfigError::Parse` for an unreadable file
    /// - `ConfigError::Invalid` if validation fails
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading comanda config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path cannot be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if let Some(minutes) = self.engine.utc_offset_minutes {
            if minutes.abs() > MAX_OFFSET_MINUTES {
                return Err(ConfigError::Invalid(format!(
                    "engine.utc_offset_minutes must be within ±{}",
                    MAX_OFFSET_MINUTES
                )));
            }
        }
        Ok(())
    }

    /// Pool configuration for [`comanda_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }

    /// Wall clock on the configured calendar.
    pub fn clock(&self) -> SystemClock {
        self.engine
            .utc_offset_minutes
            .and_then(SystemClock::with_offset_minutes)
            .unwrap_or_default()
    }

    /// Applies `COMANDA_*` overrides; unparsable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("COMANDA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("COMANDA_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.database.max_connections = max;
        }

        if let Some(retries) = lookup("COMANDA_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            debug!(retries, "Overriding conflict retries from environment");
            self.engine.max_conflict_retries = retries;
        }

        if let Some(minutes) = lookup("COMANDA_UTC_OFFSET_MINUTES").and_then(|v| v.parse().ok()) {
            debug!(minutes, "Overriding UTC offset from environment");
            self.engine.utc_offset_minutes = Some(minutes);
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "comanda", "engine")
            .map(|dirs| dirs.config_dir().join("comanda.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
