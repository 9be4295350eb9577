//! Index File Tests
//!
//! Tests verify:
//! - Records land at deterministic offsets
//! - In-place patching
//! - Replay order and duplicate keys
//! - Repair of a torn trailing record

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use timeslicer::index::{encode, IndexEntry, InMemoryIndex, RECORD_SIZE};
use timeslicer::storage::IndexFile;
use timeslicer::TimeslicerError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_index() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.index");
    (temp_dir, path)
}

fn entry(key: &str, data_offset: u64, record: u64) -> IndexEntry {
    IndexEntry {
        key: key.to_string(),
        data_offset,
        data_length: 10,
        index_offset: record * RECORD_SIZE as u64,
    }
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_new_records_append_at_next_slot() {
    let (_temp, path) = setup_temp_index();
    let mut index_file = IndexFile::open(&path).unwrap();

    assert_eq!(index_file.next_offset(), 0);
    index_file.write_record(&entry("a", 0, 0)).unwrap();
    assert_eq!(index_file.next_offset(), RECORD_SIZE as u64);
    index_file.write_record(&entry("b", 10, 1)).unwrap();

    assert_eq!(index_file.record_count(), 2);
    assert_eq!(fs::metadata(&path).unwrap().len(), 2 * RECORD_SIZE as u64);
}

#[test]
fn test_patch_rewrites_only_its_record() {
    let (_temp, path) = setup_temp_index();
    let mut index_file = IndexFile::open(&path).unwrap();
    index_file.write_record(&entry("a", 0, 0)).unwrap();
    index_file.write_record(&entry("b", 10, 1)).unwrap();
    index_file.write_record(&entry("c", 20, 2)).unwrap();
    index_file.sync().unwrap();

    let before = fs::read(&path).unwrap();
    index_file.write_record(&entry("b", 30, 1)).unwrap();
    index_file.sync().unwrap();
    let after = fs::read(&path).unwrap();

    assert_eq!(before.len(), after.len());
    let slot = RECORD_SIZE..2 * RECORD_SIZE;
    assert_eq!(before[..slot.start], after[..slot.start]);
    assert_eq!(before[slot.end..], after[slot.end..]);
    assert_ne!(before[slot.clone()], after[slot.clone()]);

    assert_eq!(index_file.read_record(RECORD_SIZE as u64).unwrap(), entry("b", 30, 1));
}

#[test]
fn test_write_rejects_misaligned_or_far_offsets() {
    let (_temp, path) = setup_temp_index();
    let mut index_file = IndexFile::open(&path).unwrap();

    let mut misaligned = entry("a", 0, 0);
    misaligned.index_offset = 5;
    assert!(matches!(
        index_file.write_record(&misaligned),
        Err(TimeslicerError::Storage(_))
    ));

    // Slot 1 does not exist until slot 0 is written
    assert!(index_file.write_record(&entry("a", 0, 1)).is_err());
    assert_eq!(index_file.record_count(), 0);
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_empty_file() {
    let (_temp, path) = setup_temp_index();
    let mut index_file = IndexFile::open(&path).unwrap();

    let result = index_file.replay().unwrap();

    assert!(result.entries.is_empty());
    assert_eq!(result.records_read, 0);
    assert_eq!(result.truncated_bytes, 0);
}

#[test]
fn test_replay_returns_records_in_file_order() {
    let (_temp, path) = setup_temp_index();
    {
        let mut index_file = IndexFile::open(&path).unwrap();
        index_file.write_record(&entry("a", 0, 0)).unwrap();
        index_file.write_record(&entry("b", 10, 1)).unwrap();
        index_file.sync().unwrap();
    }

    let mut index_file = IndexFile::open(&path).unwrap();
    let result = index_file.replay().unwrap();

    assert_eq!(result.records_read, 2);
    assert_eq!(result.entries, vec![entry("a", 0, 0), entry("b", 10, 1)]);
}

#[test]
fn test_replay_tolerates_duplicate_keys_last_wins() {
    let (_temp, path) = setup_temp_index();
    {
        // Older files could hold several records for one key
        let mut index_file = IndexFile::open(&path).unwrap();
        index_file.write_record(&entry("a", 0, 0)).unwrap();
        index_file.write_record(&entry("b", 10, 1)).unwrap();
        index_file.write_record(&entry("a", 20, 2)).unwrap();
        index_file.sync().unwrap();
    }

    let mut index_file = IndexFile::open(&path).unwrap();
    let result = index_file.replay().unwrap();
    assert_eq!(result.records_read, 3);

    let index = InMemoryIndex::from_replay(result.entries);
    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup("a"), Some(entry("a", 20, 2)));
}

#[test]
fn test_replay_cuts_torn_trailing_record() {
    let (_temp, path) = setup_temp_index();
    {
        let mut index_file = IndexFile::open(&path).unwrap();
        index_file.write_record(&entry("a", 0, 0)).unwrap();
        index_file.sync().unwrap();
    }
    {
        let torn = encode(&entry("b", 10, 1)).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&torn[..100]).unwrap();
        file.sync_all().unwrap();
    }

    let mut index_file = IndexFile::open(&path).unwrap();
    let result = index_file.replay().unwrap();

    assert_eq!(result.entries, vec![entry("a", 0, 0)]);
    assert_eq!(result.truncated_bytes, 100);
    assert_eq!(fs::metadata(&path).unwrap().len(), RECORD_SIZE as u64);
    assert_eq!(index_file.next_offset(), RECORD_SIZE as u64);
}

#[test]
fn test_replay_rejects_corrupt_record() {
    let (_temp, path) = setup_temp_index();
    {
        let mut index_file = IndexFile::open(&path).unwrap();
        index_file.write_record(&entry("a", 0, 0)).unwrap();
        index_file.write_record(&entry("b", 10, 1)).unwrap();
        index_file.sync().unwrap();
    }

    let mut bytes = fs::read(&path).unwrap();
    bytes[RECORD_SIZE + 3] = b'X';
    fs::write(&path, &bytes).unwrap();

    let mut index_file = IndexFile::open(&path).unwrap();
    let err = index_file.replay().unwrap_err();
    assert!(matches!(err, TimeslicerError::MalformedRecord(_)));
}

#[test]
fn test_replay_rejects_record_in_wrong_slot() {
    let (_temp, path) = setup_temp_index();

    // A valid record claiming slot 1, stored in slot 0
    let record = encode(&entry("a", 0, 1)).unwrap();
    fs::write(&path, record).unwrap();

    let mut index_file = IndexFile::open(&path).unwrap();
    let err = index_file.replay().unwrap_err();
    assert!(matches!(err, TimeslicerError::MalformedRecord(msg) if msg.contains("claims offset")));
}
