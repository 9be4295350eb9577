//! Index Module
//!
//! Maps each primary key to the current location of its value in the data log.
//!
//! ## Responsibilities
//! - Fixed-width on-disk record format (codec)
//! - In-memory lookup table rebuilt from the index file at startup
//!
//! ## Record Layout
//! ```text
//! ┌────────┬───────────┬─────────────┬────────────┬──────────────┬───────┬────┐
//! │KeyLen 3│ Key 255   │ DataOff 20  │ DataLen 10 │ IndexOff 20  │ CRC 8 │ \n │
//! └────────┴───────────┴─────────────┴────────────┴──────────────┴───────┴────┘
//! ```
//! Numbers are zero-padded ASCII decimal, the key is right-padded with spaces and
//! the CRC is lowercase hex over everything before it. Every record is
//! [`RECORD_SIZE`] bytes, so record `i` lives at `i * RECORD_SIZE`.

mod codec;
mod table;

pub use codec::{decode, encode, RECORD_SIZE};
pub use table::InMemoryIndex;

/// Longest key the index record can hold
pub const MAX_KEY_LEN: usize = 255;

/// Location of one key's current value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Primary key
    pub key: String,

    /// Byte offset of the value in the data log
    pub data_offset: u64,

    /// Byte length of the value
    pub data_length: u32,

    /// Byte offset of this entry's own record in the index file.
    /// Assigned on first insert and reused by every update.
    pub index_offset: u64,
}

impl IndexEntry {
    /// End of the value's byte range in the data log
    pub fn data_end(&self) -> u64 {
        self.data_offset + u64::from(self.data_length)
    }

    /// Position of this record counted in records
    pub fn record_number(&self) -> u64 {
        self.index_offset / RECORD_SIZE as u64
    }
}
