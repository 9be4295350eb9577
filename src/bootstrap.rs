//! Bootstrap
//!
//! Locates the store directory, opens both files and rebuilds the in-memory
//! index from the index file. Every failure here is fatal: a store that
//! cannot be opened consistently refuses to serve.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, TimeslicerError};
use crate::index::InMemoryIndex;
use crate::storage::{IndexFile, RecordLog, StoreFiles};

/// Store directory relative to the user's home
pub const STORE_DIR: [&str; 2] = [".config", "timeslicer"];

/// Where a store's files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    dir: PathBuf,
    name: String,
}

impl StoreLayout {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Directory holding both files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<dir>/<name>.db`
    pub fn data_path(&self) -> PathBuf {
        self.dir.join(format!("{}.db", self.name))
    }

    /// `<dir>/<name>.index`
    pub fn index_path(&self) -> PathBuf {
        self.dir.join(format!("{}.index", self.name))
    }
}

/// What bootstrap hands to the engine
pub struct OpenedStore {
    pub files: StoreFiles,
    pub index: InMemoryIndex,
    pub summary: BootstrapSummary,
}

/// Numbers logged once a store is open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Index records replayed
    pub records_replayed: u64,

    /// Distinct live keys after replay
    pub live_keys: usize,

    /// Bytes of a torn trailing index record that were cut off
    pub truncated_bytes: u64,

    /// Data log size at open
    pub data_size: u64,
}

/// Opens store files for one layout
///
/// Built once by `Engine::open` and owned by the engine afterwards.
#[derive(Debug, Clone)]
pub struct StoreBuilder {
    layout: StoreLayout,
}

impl StoreBuilder {
    /// Resolve the layout for a config, creating the store directory
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.store_name.is_empty() {
            return Err(TimeslicerError::Bootstrap(
                "store name must not be empty".to_string(),
            ));
        }

        let dir = match &config.store_dir {
            Some(dir) => init_dir(dir)?,
            None => default_store_dir()?,
        };

        Ok(Self {
            layout: StoreLayout::new(dir, &config.store_name),
        })
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Open or create both files and replay the index
    pub fn open(&self) -> Result<OpenedStore> {
        let data_path = self.layout.data_path();
        let index_path = self.layout.index_path();

        tracing::info!(store = %self.layout.name(), dir = %self.layout.dir().display(), "Connecting to store");

        let log = RecordLog::open(&data_path).map_err(|e| {
            TimeslicerError::Bootstrap(format!("cannot open {}: {}", data_path.display(), e))
        })?;
        let mut index_file = IndexFile::open(&index_path).map_err(|e| {
            TimeslicerError::Bootstrap(format!("cannot open {}: {}", index_path.display(), e))
        })?;

        let replay = index_file.replay()?;

        // Replayed entries must point inside the data log. The write ordering
        // guarantees this, so a violation means the files were damaged.
        if let Some(entry) = replay.entries.iter().find(|e| e.data_end() > log.size()) {
            return Err(TimeslicerError::MalformedRecord(format!(
                "key {:?} points at {}..{} but {} is {} bytes",
                entry.key,
                entry.data_offset,
                entry.data_end(),
                data_path.display(),
                log.size()
            )));
        }

        let records_replayed = replay.records_read;
        let index = InMemoryIndex::from_replay(replay.entries);

        let summary = BootstrapSummary {
            records_replayed,
            live_keys: index.len(),
            truncated_bytes: replay.truncated_bytes,
            data_size: log.size(),
        };

        tracing::info!(
            records = summary.records_replayed,
            keys = summary.live_keys,
            data_bytes = summary.data_size,
            "Connected"
        );

        Ok(OpenedStore {
            files: StoreFiles { log, index_file },
            index,
            summary,
        })
    }
}

/// `$HOME/.config/timeslicer`, created if absent
pub fn default_store_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        TimeslicerError::Bootstrap("could not determine home directory".to_string())
    })?;
    init_store_dir(&home)
}

/// The store directory under a given home, created if absent
pub fn init_store_dir(home: &Path) -> Result<PathBuf> {
    let dir = STORE_DIR.iter().fold(home.to_path_buf(), |dir, part| dir.join(part));
    init_dir(&dir)
}

fn init_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| {
        TimeslicerError::Bootstrap(format!("could not access store dir {}: {}", dir.display(), e))
    })?;
    Ok(dir.to_path_buf())
}
