//! Store-wide durability status
//!
//! Per-request sync failures are not returned to the caller of `set` (it has
//! already returned); they are counted here for operators to inspect.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::TimeslicerError;

/// Snapshot of the engine's durability counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    /// Requests written and fsynced
    pub durable_writes: u64,

    /// Requests dropped after an I/O error
    pub failed_writes: u64,

    /// Values accepted by `set` that are not durable yet
    pub pending_writes: usize,

    /// Description of the most recent failure
    pub last_error: Option<String>,
}

impl StoreHealth {
    /// No sync has failed since the store was opened
    pub fn is_healthy(&self) -> bool {
        self.failed_writes == 0
    }
}

#[derive(Debug, Default)]
pub(crate) struct HealthTracker {
    durable_writes: AtomicU64,
    failed_writes: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl HealthTracker {
    pub(crate) fn record_success(&self) {
        self.durable_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, key: &str, err: &TimeslicerError) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(format!("sync of key {:?} failed: {}", key, err));
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub(crate) fn snapshot(&self, pending_writes: usize) -> StoreHealth {
        StoreHealth {
            durable_writes: self.durable_writes.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
            pending_writes,
            last_error: self.last_error(),
        }
    }
}
