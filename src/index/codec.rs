//! Index record codec
//!
//! Encodes one [`IndexEntry`] into its fixed-width record and back.

use std::ops::Range;

use crate::error::{Result, TimeslicerError};

use super::{IndexEntry, MAX_KEY_LEN};

// =============================================================================
// Column Layout
// =============================================================================

const KEY_LEN_COL: Range<usize> = 0..3;
const KEY_COL: Range<usize> = 3..3 + MAX_KEY_LEN;
const DATA_OFFSET_COL: Range<usize> = 258..278;
const DATA_LENGTH_COL: Range<usize> = 278..288;
const INDEX_OFFSET_COL: Range<usize> = 288..308;
const CHECKSUM_COL: Range<usize> = 308..316;
const TERMINATOR_POS: usize = 316;

/// Width of one index record in bytes
pub const RECORD_SIZE: usize = 317;

const KEY_PAD: u8 = b' ';
const TERMINATOR: u8 = b'\n';

/// Encode an entry into its fixed-width record
pub fn encode(entry: &IndexEntry) -> Result<[u8; RECORD_SIZE]> {
    let key = entry.key.as_bytes();
    if key.len() > MAX_KEY_LEN {
        return Err(TimeslicerError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }

    let mut record = [KEY_PAD; RECORD_SIZE];

    write_number(&mut record[KEY_LEN_COL], key.len() as u64);
    record[KEY_COL.start..KEY_COL.start + key.len()].copy_from_slice(key);
    write_number(&mut record[DATA_OFFSET_COL], entry.data_offset);
    write_number(&mut record[DATA_LENGTH_COL], u64::from(entry.data_length));
    write_number(&mut record[INDEX_OFFSET_COL], entry.index_offset);

    let checksum = crc32fast::hash(&record[..CHECKSUM_COL.start]);
    record[CHECKSUM_COL].copy_from_slice(format!("{:08x}", checksum).as_bytes());
    record[TERMINATOR_POS] = TERMINATOR;

    Ok(record)
}

/// Decode a fixed-width record
///
/// Only the first [`RECORD_SIZE`] bytes are looked at. Fails with
/// `MalformedRecord` on a short block or any column that does not parse.
pub fn decode(bytes: &[u8]) -> Result<IndexEntry> {
    if bytes.len() < RECORD_SIZE {
        return Err(malformed(format!(
            "expected {} bytes, got {}",
            RECORD_SIZE,
            bytes.len()
        )));
    }
    let record = &bytes[..RECORD_SIZE];

    if record[TERMINATOR_POS] != TERMINATOR {
        return Err(malformed("missing record terminator".to_string()));
    }

    let stored_checksum = read_hex(&record[CHECKSUM_COL], "checksum")?;
    let actual_checksum = crc32fast::hash(&record[..CHECKSUM_COL.start]);
    if stored_checksum != actual_checksum {
        return Err(malformed(format!(
            "checksum mismatch: stored {:08x}, computed {:08x}",
            stored_checksum, actual_checksum
        )));
    }

    let key_len = read_number(&record[KEY_LEN_COL], "key length")? as usize;
    if key_len > MAX_KEY_LEN {
        return Err(malformed(format!("key length {} exceeds {}", key_len, MAX_KEY_LEN)));
    }

    let key_col = &record[KEY_COL];
    if key_col[key_len..].iter().any(|&b| b != KEY_PAD) {
        return Err(malformed("key padding is not blank".to_string()));
    }
    let key = std::str::from_utf8(&key_col[..key_len])
        .map_err(|e| malformed(format!("key is not UTF-8: {}", e)))?
        .to_string();

    let data_length = read_number(&record[DATA_LENGTH_COL], "data length")?;
    let data_length = u32::try_from(data_length)
        .map_err(|_| malformed(format!("data length {} out of range", data_length)))?;

    Ok(IndexEntry {
        key,
        data_offset: read_number(&record[DATA_OFFSET_COL], "data offset")?,
        data_length,
        index_offset: read_number(&record[INDEX_OFFSET_COL], "index offset")?,
    })
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Zero-padded decimal filling the whole column
fn write_number(column: &mut [u8], value: u64) {
    let text = format!("{:0width$}", value, width = column.len());
    column.copy_from_slice(text.as_bytes());
}

fn read_number(column: &[u8], field: &str) -> Result<u64> {
    if !column.iter().all(u8::is_ascii_digit) {
        return Err(malformed(format!("{} column is not numeric", field)));
    }
    // Columns hold ASCII digits only, so utf8 and parse can only fail on overflow
    std::str::from_utf8(column)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| malformed(format!("{} column overflows", field)))
}

fn read_hex(column: &[u8], field: &str) -> Result<u32> {
    std::str::from_utf8(column)
        .ok()
        .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| malformed(format!("{} column is not hex", field)))
}

fn malformed(reason: String) -> TimeslicerError {
    TimeslicerError::MalformedRecord(reason)
}
