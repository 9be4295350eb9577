//! Record Log
//!
//! The data file: opaque value bytes addressed by offset and length.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, TimeslicerError};

/// Append-mostly byte file holding stored values
///
/// Positions and lengths are known only through the index; the file has no
/// header and no framing.
pub struct RecordLog {
    /// Path to the data file
    path: PathBuf,
    /// Read/write handle (not opened in append mode so `write_at` can patch)
    file: File,
    /// Current file length, kept in step with every write
    size: u64,
}

impl RecordLog {
    /// Open or create the data file
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

    /// Write `bytes` at the current end of file and return their offset
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.size;
        self.write_at(offset, bytes)?;
        Ok(offset)
    }

    /// Write `bytes` at `offset`, extending the file if needed
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        if offset > self.size {
            return Err(TimeslicerError::Storage(format!(
                "write at {} would leave a hole in {} (size {})",
                offset,
                self.path.display(),
                self.size
            )));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.size = self.size.max(offset + bytes.len() as u64);
        Ok(())
    }

    /// Read exactly `length` bytes starting at `offset`
    pub fn read_at(&mut self, offset: u64, length: u32) -> Result<Vec<u8>> {
        let end = offset + u64::from(length);
        if end > self.size {
            return Err(TimeslicerError::Storage(format!(
                "read of {}..{} past end of {} (size {})",
                offset,
                end,
                self.path.display(),
                self.size
            )));
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Flush written bytes to stable storage
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Current length of the data file
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
