//! In-memory index implementation
//!
//! HashMap-based table with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::IndexEntry;

/// Runtime lookup table: key → current [`IndexEntry`]
///
/// Readers take the read lock; only bootstrap replay and the durability
/// worker call [`upsert`](Self::upsert).
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl InMemoryIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index by replaying entries in file order (last record per key wins)
    pub fn from_replay(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let index = Self::new();
        for entry in entries {
            index.upsert(entry);
        }
        index
    }

    /// Get the entry for a key (read lock)
    pub fn lookup(&self, key: &str) -> Option<IndexEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or replace the entry for its key (write lock)
    pub fn upsert(&self, entry: IndexEntry) {
        self.entries.write().insert(entry.key.clone(), entry);
    }

    /// Whether a key has a durable entry
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, sorted by key
    pub fn snapshot(&self) -> Vec<IndexEntry> {
        let mut entries: Vec<IndexEntry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}
