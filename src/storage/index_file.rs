//! Index File
//!
//! Fixed-width index records at deterministic positions.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TimeslicerError};
use crate::index::{self, IndexEntry, RECORD_SIZE};

/// Outcome of replaying the index file
#[derive(Debug, Default)]
pub struct ReplayResult {
    /// Every decoded record, in file order (may repeat a key)
    pub entries: Vec<IndexEntry>,

    /// Number of whole records read
    pub records_read: u64,

    /// Bytes of an incomplete trailing record that were cut off
    pub truncated_bytes: u64,
}

/// The `<store>.index` file
pub struct IndexFile {
    path: PathBuf,
    file: File,
    size: u64,
}

impl IndexFile {
    /// Open or create the index file
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Read every record from the start of the file
    ///
    /// A trailing block shorter than one record is the remains of an
    /// interrupted append: it is cut off and the file synced. A whole record
    /// that fails to decode, or that claims a different position than the one
    /// it was read from, is an error.
    pub fn replay(&mut self) -> Result<ReplayResult> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut contents = Vec::with_capacity(self.size as usize);
        self.file.read_to_end(&mut contents)?;

        let mut result = ReplayResult::default();
        let mut chunks = contents.chunks_exact(RECORD_SIZE);

        for (i, chunk) in chunks.by_ref().enumerate() {
            let position = (i * RECORD_SIZE) as u64;
            let entry = index::decode(chunk).map_err(|e| {
                TimeslicerError::MalformedRecord(format!(
                    "{} at offset {}: {}",
                    self.path.display(),
                    position,
                    e
                ))
            })?;

            if entry.index_offset != position {
                return Err(TimeslicerError::MalformedRecord(format!(
                    "{} at offset {}: record claims offset {}",
                    self.path.display(),
                    position,
                    entry.index_offset
                )));
            }

            result.entries.push(entry);
            result.records_read += 1;
        }

        let remainder = chunks.remainder().len() as u64;
        if remainder > 0 {
            let aligned = self.size - remainder;
            tracing::warn!(
                path = %self.path.display(),
                truncated_bytes = remainder,
                "Discarding incomplete trailing index record"
            );
            self.file.set_len(aligned)?;
            self.file.sync_all()?;
            self.size = aligned;
            result.truncated_bytes = remainder;
        }

        Ok(result)
    }

    /// Write a record at `entry.index_offset`
    ///
    /// Patches the record in place when the offset already exists, appends
    /// when it equals [`next_offset`](Self::next_offset).
    pub fn write_record(&mut self, entry: &IndexEntry) -> Result<()> {
        let offset = entry.index_offset;
        if offset % RECORD_SIZE as u64 != 0 || offset > self.next_offset() {
            return Err(TimeslicerError::Storage(format!(
                "index offset {} is not a record slot of {} (next slot {})",
                offset,
                self.path.display(),
                self.next_offset()
            )));
        }

        let record = index::encode(entry)?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&record)?;
        self.size = self.size.max(offset + RECORD_SIZE as u64);
        Ok(())
    }

    /// Read the record stored at `offset`
    pub fn read_record(&mut self, offset: u64) -> Result<IndexEntry> {
        if offset + RECORD_SIZE as u64 > self.size {
            return Err(TimeslicerError::Storage(format!(
                "no record at offset {} of {}",
                offset,
                self.path.display()
            )));
        }

        let mut buf = [0u8; RECORD_SIZE];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        index::decode(&buf)
    }

    /// Offset a newly inserted key gets: the first free record slot
    ///
    /// Rounded down, so bytes left by a failed partial append get overwritten.
    pub fn next_offset(&self) -> u64 {
        self.record_count() * RECORD_SIZE as u64
    }

    /// Number of whole records in the file
    pub fn record_count(&self) -> u64 {
        self.size / RECORD_SIZE as u64
    }

    /// Flush written records to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
