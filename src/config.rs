//! TOML configuration for chorewatch.
//!
//! The file lives at `$CHOREWATCH_CONFIG` when set, otherwise at
//! `<config dir>/chorewatch/config.toml`. It is re-read at the start of every
//! cycle so edits take effect without a restart.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CHOREWATCH_CONFIG";

const DEFAULT_GROCY_URL: &str = "http://localhost:8080/api";
const DEFAULT_API_KEY: &str = "your-api-key-here";
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_CHECK_TIMEOUT_MINUTES: i64 = 1;

/// Longest polling interval honoured: one year.
pub const MAX_CHECK_TIMEOUT_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine the user config directory")]
    NoConfigDir,

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Connection and polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grocy API root, e.g. `http://grocy.local/api`.
    pub grocy_url: String,
    pub api_key: String,
    /// Only chores assigned to this Grocy username are watched.
    pub username: String,
    /// Minutes between automatic checks.
    pub check_timeout_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grocy_url: DEFAULT_GROCY_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            check_timeout_minutes: DEFAULT_CHECK_TIMEOUT_MINUTES,
        }
    }
}

impl Config {
    /// Replace empty or out-of-range fields with defaults.
    /// Returns `true` if anything changed.
    pub fn fill_defaults(&mut self) -> bool {
        let defaults = Self::default();
        let mut changed = false;

        if self.grocy_url.is_empty() {
            self.grocy_url = defaults.grocy_url;
            changed = true;
        }
        if self.api_key.is_empty() {
            self.api_key = defaults.api_key;
            changed = true;
        }
        if self.username.is_empty() {
            self.username = defaults.username;
            changed = true;
        }
        if self.check_timeout_minutes <= 0 {
            self.check_timeout_minutes = defaults.check_timeout_minutes;
            changed = true;
        }

        changed
    }

    /// Polling interval, clamped to between one minute and one year.
    pub fn check_interval(&self) -> Duration {
        let minutes = self
            .check_timeout_minutes
            .clamp(1, MAX_CHECK_TIMEOUT_MINUTES) as u64;
        Duration::from_secs(minutes.saturating_mul(60))
    }

    /// The API key with all but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let len = self.api_key.chars().count();
        if len <= 4 {
            return "*".repeat(len);
        }
        let tail: String = self.api_key.chars().skip(len - 4).collect();
        format!("{}{}", "*".repeat(len - 4), tail)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }
}

/// Resolve the config file path: `$CHOREWATCH_CONFIG`, then the platform
/// config directory.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    dirs::config_dir()
        .map(|dir| dir.join("chorewatch").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// What happened when a [`FileConfigSource`] was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// File existed and was complete.
    Loaded,
    /// File existed but some fields were filled with defaults and saved.
    Completed,
    /// No file existed; a default one was written.
    Created,
}

/// Where the polling controller gets its configuration each cycle.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<Config, ConfigError>;

    /// Load and report whether the backing store had to be created or
    /// completed.
    fn load_with_status(&self) -> Result<(Config, LoadStatus), ConfigError> {
        self.load().map(|config| (config, LoadStatus::Loaded))
    }

    /// Location to show the user for editing, if the config is file-backed.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Config backed by a TOML file on disk.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use [`default_path`].
    pub fn from_env() -> Result<Self, ConfigError> {
        default_path().map(Self::new)
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<Config, ConfigError> {
        self.load_with_status().map(|(config, _)| config)
    }

    /// Creates a default file when none exists and saves back any defaults
    /// that had to be filled in.
    fn load_with_status(&self) -> Result<(Config, LoadStatus), ConfigError> {
        if !self.path.exists() {
            let config = Config::default();
            config.save(&self.path)?;
            info!(
                path = %self.path.display(),
                "Created default config. Please edit it with your actual values."
            );
            return Ok((config, LoadStatus::Created));
        }

        let mut config = Config::load(&self.path)?;
        if !config.fill_defaults() {
            return Ok((config, LoadStatus::Loaded));
        }

        match config.save(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Updated config with default values for missing fields"),
            Err(e) => warn!(error = %e, "Failed to save updated config"),
        }
        Ok((config, LoadStatus::Completed))
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Fixed in-memory config.
#[derive(Debug, Clone)]
pub struct StaticConfig(pub Config);

impl ConfigSource for StaticConfig {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
