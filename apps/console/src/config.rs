//! # Console Configuration
//!
//! Settings for the database connection, listings and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INVENTA_DB_PATH=/srv/inventa/inventa.db                            │
//! │     INVENTA_PAGE_SIZE=25                                               │
//! │     INVENTA_MAX_CONNECTIONS=1                                          │
//! │     INVENTA_LOG=debug                                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $INVENTA_CONFIG, or                                                │
//! │     ~/.config/inventory/config.toml (Linux)                            │
//! │     ~/Library/Application Support/com.inventa.inventory/config.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     inventa.db in the platform data dir, one connection, 10 rows/page  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/home/ana/inventa.db"
//! max_connections = 1
//! query_timeout_secs = 30
//!
//! [display]
//! page_size = 10
//! show_deleted = false
//! show_error_details = true
//!
//! [logging]
//! filter = "inventa=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading or checking the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first run.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size. One connection is shared by every repository.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a statement waits on a locked database (seconds).
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("inventa.db"))
        .unwrap_or_else(|| PathBuf::from("inventa.db"))
}

fn default_max_connections() -> u32 {
    1
}

fn default_query_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl DatabaseSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

// =============================================================================
// Display Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Rows printed before the `-- more (Enter) --` prompt.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Include inactive users in listings.
    #[serde(default)]
    pub show_deleted: bool,

    /// Append the underlying database message to error lines.
    #[serde(default = "default_true")]
    pub show_error_details: bool,
}

fn default_page_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            page_size: default_page_size(),
            show_deleted: false,
            show_error_details: true,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive. `RUST_LOG` still wins when set.
    #[serde(default)]
    pub filter: Option<String>,
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete console configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`INVENTA_CONFIG` or the platform config.toml)
    /// 3. Environment variables
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var_os("INVENTA_CONFIG")
            .map(PathBuf::from)
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) => Self::from_file_or_default(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn from_file_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.display.page_size == 0 {
            return Err(ConfigError::Invalid(
                "display.page_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment
    /// in production).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("INVENTA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(size) = lookup("INVENTA_PAGE_SIZE") {
            match size.parse::<usize>() {
                Ok(n) => self.display.page_size = n,
                Err(_) => warn!(value = %size, "Ignoring non-numeric INVENTA_PAGE_SIZE"),
            }
        }

        if let Some(max) = lookup("INVENTA_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric INVENTA_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = lookup("INVENTA_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "inventa", "inventory")
}
