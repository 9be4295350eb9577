//! Durability worker
//!
//! One thread drains the sync queue in FIFO order and is the only code that
//! mutates the store files.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bytes::Bytes;
use crossbeam::channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::{Result, TimeslicerError};
use crate::index::{InMemoryIndex, IndexEntry};
use crate::storage::StoreFiles;

use super::health::HealthTracker;

/// Messages accepted by the worker
pub(crate) enum SyncMessage {
    /// Make one accepted value durable
    Persist(SyncRequest),

    /// Acknowledge once everything queued before it has been handled
    Flush(Sender<()>),
}

pub(crate) struct SyncRequest {
    pub key: String,
    pub seq: u64,
    pub value: Bytes,
}

/// A value accepted by `set` but not yet durable
pub(crate) struct PendingWrite {
    pub seq: u64,
    pub value: Bytes,
}

// =============================================================================
// Worker Gate
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Running,
    Paused,
    /// Closing: runs to the end of the queue and ignores further pauses
    Draining,
    Aborted,
}

/// Lets the engine hold or stop the worker between requests
pub(crate) struct WorkerGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl WorkerGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Running),
            changed: Condvar::new(),
        }
    }

    pub(crate) fn pause(&self) {
        let mut state = self.state.lock();
        if *state == GateState::Running {
            *state = GateState::Paused;
        }
    }

    pub(crate) fn resume(&self) {
        let mut state = self.state.lock();
        if *state == GateState::Paused {
            *state = GateState::Running;
            self.changed.notify_all();
        }
    }

    /// Release a paused worker for good so it can empty the queue
    pub(crate) fn drain(&self) {
        let mut state = self.state.lock();
        if matches!(*state, GateState::Running | GateState::Paused) {
            *state = GateState::Draining;
            self.changed.notify_all();
        }
    }

    pub(crate) fn abort(&self) {
        *self.state.lock() = GateState::Aborted;
        self.changed.notify_all();
    }

    pub(crate) fn is_paused(&self) -> bool {
        *self.state.lock() == GateState::Paused
    }

    /// Block while paused. Returns false once aborted.
    fn wait_until_runnable(&self) -> bool {
        let mut state = self.state.lock();
        while *state == GateState::Paused {
            self.changed.wait(&mut state);
        }
        *state != GateState::Aborted
    }
}

// =============================================================================
// Shared Engine State
// =============================================================================

/// State shared between the engine handle and the worker thread
pub(crate) struct Shared {
    /// Both files behind one lock; `None` once the engine is closed
    pub(crate) files: Mutex<Option<StoreFiles>>,
    pub(crate) index: InMemoryIndex,
    pub(crate) pending: RwLock<HashMap<String, PendingWrite>>,
    pub(crate) health: HealthTracker,
    pub(crate) gate: WorkerGate,
    pub(crate) closed: AtomicBool,
}

impl Shared {
    pub(crate) fn new(files: StoreFiles, index: InMemoryIndex) -> Self {
        Self {
            files: Mutex::new(Some(files)),
            index,
            pending: RwLock::new(HashMap::new()),
            health: HealthTracker::default(),
            gate: WorkerGate::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Make one request durable, or record why it could not be
    fn persist(&self, request: SyncRequest) {
        let result = {
            let mut files = self.files.lock();
            match files.as_mut() {
                Some(files) => self.write_through(files, &request),
                None => Err(TimeslicerError::StoreClosed),
            }
        };

        match result {
            Ok(entry) => {
                tracing::debug!(
                    key = %entry.key,
                    data_offset = entry.data_offset,
                    data_length = entry.data_length,
                    index_offset = entry.index_offset,
                    "Saved row"
                );
                // Repoint the index before dropping the pending value so a
                // reader always finds one or the other.
                self.index.upsert(entry);
                self.clear_pending(&request.key, request.seq);
                self.health.record_success();
            }
            Err(err) => {
                tracing::error!(key = %request.key, error = %err, "Failed to persist row, request dropped");
                self.health.record_failure(&request.key, &err);
            }
        }
    }

    /// value → fsync log → index record → fsync index
    fn write_through(&self, files: &mut StoreFiles, request: &SyncRequest) -> Result<IndexEntry> {
        let data_length = u32::try_from(request.value.len()).map_err(|_| {
            TimeslicerError::ValueTooLarge {
                len: request.value.len(),
                max: u64::from(u32::MAX),
            }
        })?;

        let data_offset = files.log.append(&request.value)?;
        files.log.sync()?;

        let index_offset = match self.index.lookup(&request.key) {
            Some(existing) => existing.index_offset,
            None => files.index_file.next_offset(),
        };

        let entry = IndexEntry {
            key: request.key.clone(),
            data_offset,
            data_length,
            index_offset,
        };
        files.index_file.write_record(&entry)?;
        files.index_file.sync()?;

        Ok(entry)
    }

    /// Forget the pending value unless a newer `set` replaced it meanwhile
    fn clear_pending(&self, key: &str, seq: u64) {
        let mut pending = self.pending.write();
        if pending.get(key).map_or(false, |p| p.seq == seq) {
            pending.remove(key);
        }
    }
}

/// Worker loop. Returns when the queue is closed and empty, or on abort.
pub(crate) fn run(shared: Arc<Shared>, receiver: Receiver<SyncMessage>) {
    tracing::debug!("Durability worker started");

    for message in receiver.iter() {
        if !shared.gate.wait_until_runnable() {
            let discarded = 1 + receiver.try_iter().count();
            tracing::warn!(discarded, "Durability worker aborted, queued requests dropped");
            return;
        }

        match message {
            SyncMessage::Persist(request) => shared.persist(request),
            SyncMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    tracing::debug!("Durability worker drained, stopping");
}
