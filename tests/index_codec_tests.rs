//! Index Codec Tests
//!
//! Tests verify:
//! - Fixed record width
//! - Every field lands in its own column
//! - Rejection of short, damaged and oversized records

use timeslicer::index::{decode, encode, IndexEntry, MAX_KEY_LEN, RECORD_SIZE};
use timeslicer::TimeslicerError;

fn entry(key: &str, data_offset: u64, data_length: u32, index_offset: u64) -> IndexEntry {
    IndexEntry {
        key: key.to_string(),
        data_offset,
        data_length,
        index_offset,
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encoded_record_has_fixed_width() {
    let short = encode(&entry("a", 0, 0, 0)).unwrap();
    let long = encode(&entry(&"k".repeat(MAX_KEY_LEN), u64::MAX, u32::MAX, u64::MAX)).unwrap();

    assert_eq!(short.len(), RECORD_SIZE);
    assert_eq!(long.len(), RECORD_SIZE);
    assert_eq!(short[RECORD_SIZE - 1], b'\n');
}

#[test]
fn test_record_is_readable_text() {
    let record = encode(&entry("08h00", 42, 7, 317)).unwrap();
    let text = std::str::from_utf8(&record).unwrap();

    assert!(text.starts_with("00508h00 "));
    assert!(text.contains("00000000000000000042"));
    assert!(text.contains("0000000007"));
    assert!(text.contains("00000000000000000317"));
}

#[test]
fn test_key_too_long_rejected() {
    let err = encode(&entry(&"k".repeat(MAX_KEY_LEN + 1), 0, 0, 0)).unwrap_err();
    assert!(matches!(
        err,
        TimeslicerError::KeyTooLong { len, max } if len == MAX_KEY_LEN + 1 && max == MAX_KEY_LEN
    ));
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_returns_encoded_fields() {
    let original = entry("2024-03-07", 1_000, 250, 634);
    let decoded = decode(&encode(&original).unwrap()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_fields_do_not_share_columns() {
    // Distinct values per field: a decoder reading one column for two fields
    // would mix them up.
    let original = entry("key", 111_111, 222_222, 333_333);
    let decoded = decode(&encode(&original).unwrap()).unwrap();

    assert_eq!(decoded.data_offset, 111_111);
    assert_eq!(decoded.data_length, 222_222);
    assert_eq!(decoded.index_offset, 333_333);
}

#[test]
fn test_keys_with_spaces_and_unicode_survive() {
    for key in ["", " ", "lunch break ", "café ☕", "a,b;c"] {
        let original = entry(key, 5, 6, 0);
        assert_eq!(decode(&encode(&original).unwrap()).unwrap().key, key);
    }
}

#[test]
fn test_decode_ignores_bytes_after_record() {
    let original = entry("a", 1, 2, 0);
    let mut bytes = encode(&original).unwrap().to_vec();
    bytes.extend_from_slice(b"next record starts here");

    assert_eq!(decode(&bytes).unwrap(), original);
}

#[test]
fn test_short_block_is_malformed() {
    let record = encode(&entry("a", 1, 2, 0)).unwrap();

    let err = decode(&record[..RECORD_SIZE - 1]).unwrap_err();
    assert!(matches!(err, TimeslicerError::MalformedRecord(_)));

    assert!(decode(&[]).is_err());
}

#[test]
fn test_flipped_byte_is_malformed() {
    let record = encode(&entry("a", 1, 2, 0)).unwrap();

    // Key, data offset and checksum columns
    for pos in [3, 270, 310] {
        let mut damaged = record;
        damaged[pos] = if damaged[pos] == b'9' { b'8' } else { b'9' };
        let err = decode(&damaged).unwrap_err();
        assert!(matches!(err, TimeslicerError::MalformedRecord(_)), "byte {}", pos);
    }
}

#[test]
fn test_missing_terminator_is_malformed() {
    let mut record = encode(&entry("a", 1, 2, 0)).unwrap();
    record[RECORD_SIZE - 1] = b' ';

    assert!(matches!(
        decode(&record),
        Err(TimeslicerError::MalformedRecord(_))
    ));
}

#[test]
fn test_all_zero_block_is_malformed() {
    let block = [0u8; RECORD_SIZE];
    assert!(matches!(
        decode(&block),
        Err(TimeslicerError::MalformedRecord(_))
    ));
}
