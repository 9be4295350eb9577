//! Storage Module
//!
//! The two on-disk files of a store.
//!
//! ## Responsibilities
//! - Data log: values appended at end of file, read back by offset and length
//! - Index file: one fixed-width record per key, patched in place on update
//!
//! ## Files
//! ```text
//! {store_dir}/{store_name}.db
//! ┌──────────┬──────────┬──────────┬─────────────────┐
//! │ value a₁ │ value b₁ │ value a₂ │ ...             │   (a₁ is now dead space)
//! └──────────┴──────────┴──────────┴─────────────────┘
//!
//! {store_dir}/{store_name}.index
//! ┌──────────────────────┬──────────────────────┬─────┐
//! │ record "a" → a₂      │ record "b" → b₁      │ ... │   (RECORD_SIZE each)
//! └──────────────────────┴──────────────────────┴─────┘
//! ```
//!
//! ## Write Ordering
//! value bytes → fsync data → index record → fsync index.
//! A crash in between leaves unreachable bytes in the log, never an index
//! record pointing at bytes that are not there.

mod index_file;
mod record_log;

pub use index_file::{IndexFile, ReplayResult};
pub use record_log::RecordLog;

/// Both store files, always locked together
pub struct StoreFiles {
    /// Value bytes
    pub log: RecordLog,

    /// Fixed-width index records
    pub index_file: IndexFile,
}

impl StoreFiles {
    /// fsync both files
    pub fn sync_all(&mut self) -> crate::Result<()> {
        self.log.sync()?;
        self.index_file.sync()
    }
}
