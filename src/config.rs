//! Configuration for Timeslicer
//!
//! Two layers:
//! - [`Config`]: how the store engine is opened (built in code, sensible defaults)
//! - [`AppConfig`]: the application settings read from `config/<env>.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimeslicerError};

/// Main configuration for a store engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Base name of the store files.
    /// Internal structure:
    ///   {store_dir}/
    ///     ├── {store_name}.db      (data log)
    ///     └── {store_name}.index   (fixed-width index records)
    pub store_name: String,

    /// Directory holding the store files.
    /// `None` resolves to `$HOME/.config/timeslicer` at open time.
    pub store_dir: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Durability Worker Configuration
    // -------------------------------------------------------------------------
    /// Queue between `set` callers and the durability worker
    pub sync_queue: SyncQueue,

    /// Reject writes once the worker has recorded a failed sync
    pub fail_on_sync_error: bool,
}

/// Shape of the durability request queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncQueue {
    /// `set` blocks while `capacity` requests are waiting
    Bounded { capacity: usize },

    /// `set` never blocks; memory grows with the backlog
    Unbounded,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_name: "timeslicer".to_string(),
            store_dir: None,
            sync_queue: SyncQueue::Bounded { capacity: 1024 },
            fail_on_sync_error: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base name of the store files
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.config.store_name = name.into();
        self
    }

    /// Set an explicit store directory instead of the per-user default
    pub fn store_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_dir = Some(path.into());
        self
    }

    /// Set the durability queue shape
    pub fn sync_queue(mut self, queue: SyncQueue) -> Self {
        self.config.sync_queue = queue;
        self
    }

    /// Reject writes after the first failed sync
    pub fn fail_on_sync_error(mut self, enabled: bool) -> Self {
        self.config.fail_on_sync_error = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Application Settings
// =============================================================================

/// Application settings loaded from `config/<env>.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base name of the store files
    #[serde(rename = "storeName")]
    pub store_name: String,

    /// How the day is sliced
    pub timeslice: TimesliceConfig,
}

/// Day slicing settings, durations written like `30m`, `8h` or `17h30m`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimesliceConfig {
    pub interval: String,
    pub start: String,
    pub end: String,
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    /// Load `<dir>/<env_name>.toml`
    ///
    /// The server picks `env_name` from `--env` / `TIMESLICER_ENV`.
    pub fn load_env(dir: &Path, env_name: &str) -> Result<Self> {
        let path = dir.join(format!("{}.toml", env_name));
        let contents = fs::read_to_string(&path).map_err(|e| {
            TimeslicerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| TimeslicerError::Config(e.to_string()))
    }

    /// Engine config for these settings
    pub fn store_config(&self) -> ConfigBuilder {
        Config::builder().store_name(&self.store_name)
    }
}
