//! Engine Module
//!
//! The store engine that coordinates the data log, the index file and the
//! in-memory index.
//!
//! ## Responsibilities
//! - Accept writes into memory and hand them to the durability worker
//! - Serve reads from memory and the data log
//! - Drain outstanding writes on close

mod health;
mod worker;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;

use crate::bootstrap::{BootstrapSummary, StoreBuilder, StoreLayout};
use crate::config::{Config, SyncQueue};
use crate::error::{Result, TimeslicerError};
use crate::index::{IndexEntry, MAX_KEY_LEN};

pub use health::StoreHealth;
use worker::{PendingWrite, Shared, SyncMessage, SyncRequest};

/// How often a waiting `flush` checks whether the worker got paused
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Submission side of the sync queue
struct Submitter {
    /// `None` once the engine stopped accepting writes
    sender: Option<Sender<SyncMessage>>,
    next_seq: u64,
}

/// The store engine
///
/// ## Concurrency Model: Many Callers / One Durability Worker
///
/// - **`set`**: updates the in-memory pending cache and enqueues a sync
///   request, under the submission lock so that cache order and queue order
///   agree. Returns before the value is durable.
///
/// - **`get`**: pending cache first, then the in-memory index and a read of
///   the data log. Never waits for the queue to drain.
///
/// - **Worker**: a single thread drains the queue in FIFO order and is the
///   only writer of the store files. File reads and writes share one mutex.
///
/// ## Durability Trade-off
/// A value is visible to `get` as soon as `set` returns, but it is only
/// durable once the worker has fsynced it. Writes still queued when the
/// process dies are lost. A write whose sync fails is dropped and recorded in
/// [`health`](Self::health); the caller of `set` is not told.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Resolved layout, opens the files
    builder: StoreBuilder,

    /// Replay numbers from open
    summary: BootstrapSummary,

    /// State shared with the worker thread
    shared: Arc<Shared>,

    /// Sync queue sender plus sequence counter
    submitter: Mutex<Submitter>,

    /// Worker thread, joined on close
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("builder", &self.builder)
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Resolve and create the store directory
    /// 2. Open/create the data and index files
    /// 3. Replay the index file into memory
    /// 4. Start the durability worker
    pub fn open(config: Config) -> Result<Self> {
        let builder = StoreBuilder::from_config(&config)?;
        let opened = builder.open()?;

        let (sender, receiver) = match config.sync_queue {
            SyncQueue::Bounded { capacity } => channel::bounded(capacity.max(1)),
            SyncQueue::Unbounded => channel::unbounded(),
        };

        let shared = Arc::new(Shared::new(opened.files, opened.index));
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("timeslicer-sync".to_string())
            .spawn(move || worker::run(worker_shared, receiver))
            .map_err(|e| {
                TimeslicerError::Bootstrap(format!("cannot start durability worker: {}", e))
            })?;

        Ok(Self {
            config,
            builder,
            summary: opened.summary,
            shared,
            submitter: Mutex::new(Submitter {
                sender: Some(sender),
                next_seq: 0,
            }),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Open a store in an explicit directory (convenience method)
    pub fn open_path(dir: &Path, store_name: &str) -> Result<Self> {
        let config = Config::builder()
            .store_dir(dir)
            .store_name(store_name)
            .build();
        Self::open(config)
    }

    /// Get the value of a key
    ///
    /// Search order:
    /// 1. Pending cache (accepted, not yet durable)
    /// 2. In-memory index → data log
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(TimeslicerError::StoreClosed);
        }

        if let Some(pending) = self.shared.pending.read().get(key) {
            return Ok(Some(pending.value.clone()));
        }

        let Some(entry) = self.shared.index.lookup(key) else {
            return Ok(None);
        };

        let mut files = self.shared.files.lock();
        let files = files.as_mut().ok_or(TimeslicerError::StoreClosed)?;
        let bytes = files.log.read_at(entry.data_offset, entry.data_length)?;
        Ok(Some(Bytes::from(bytes)))
    }

    /// Accept a value for a key
    ///
    /// The value is visible to `get` immediately. Durability happens later on
    /// the worker; this only blocks while a bounded queue is full.
    pub fn set(&self, key: &str, value: impl Into<Bytes>) -> Result<()> {
        let value = value.into();
        validate(key, &value)?;

        if self.config.fail_on_sync_error {
            if let Some(err) = self.shared.health.last_error() {
                return Err(TimeslicerError::StoreDegraded(err));
            }
        }

        let mut submitter = self.submitter.lock();
        let seq = submitter.next_seq;
        submitter.next_seq += 1;
        let sender = submitter
            .sender
            .as_ref()
            .ok_or(TimeslicerError::StoreClosed)?;

        self.shared.pending.write().insert(
            key.to_string(),
            PendingWrite {
                seq,
                value: value.clone(),
            },
        );

        let request = SyncRequest {
            key: key.to_string(),
            seq,
            value,
        };
        if sender.send(SyncMessage::Persist(request)).is_err() {
            self.shared.pending.write().remove(key);
            return Err(TimeslicerError::StoreClosed);
        }

        tracing::debug!(key, seq, "Queued row for sync");
        Ok(())
    }

    /// Block until every write accepted before this call is durable or failed
    ///
    /// Fails with `WorkerPaused` instead of waiting when the worker is paused,
    /// whether it was paused before the call or while waiting.
    pub fn flush(&self) -> Result<()> {
        if self.shared.gate.is_paused() {
            return Err(TimeslicerError::WorkerPaused);
        }
        let ack = self.enqueue_flush()?;
        self.wait_for_ack(&ack)
    }

    fn enqueue_flush(&self) -> Result<Receiver<()>> {
        let (ack_sender, ack_receiver) = channel::bounded(1);
        let submitter = self.submitter.lock();
        let sender = submitter
            .sender
            .as_ref()
            .ok_or(TimeslicerError::StoreClosed)?;

        let mut message = SyncMessage::Flush(ack_sender);
        loop {
            match sender.send_timeout(message, PAUSE_POLL_INTERVAL) {
                Ok(()) => return Ok(ack_receiver),
                Err(SendTimeoutError::Disconnected(_)) => return Err(TimeslicerError::StoreClosed),
                Err(SendTimeoutError::Timeout(_)) if self.shared.gate.is_paused() => {
                    return Err(TimeslicerError::WorkerPaused)
                }
                Err(SendTimeoutError::Timeout(unsent)) => message = unsent,
            }
        }
    }

    fn wait_for_ack(&self, ack: &Receiver<()>) -> Result<()> {
        loop {
            match ack.recv_timeout(PAUSE_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                // The worker drops the ack unanswered only when it is aborted
                Err(RecvTimeoutError::Disconnected) => return Err(TimeslicerError::StoreClosed),
                Err(RecvTimeoutError::Timeout) if self.shared.gate.is_paused() => {
                    return Err(TimeslicerError::WorkerPaused)
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    /// Hold the worker before its next request
    pub fn pause_sync(&self) {
        self.shared.gate.pause();
    }

    /// Let a paused worker continue
    pub fn resume_sync(&self) {
        self.shared.gate.resume();
    }

    /// Close the engine gracefully
    ///
    /// Stops accepting writes, waits for the worker to drain the queue, then
    /// fsyncs and releases both files. Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        // Release a paused worker before taking the submission lock: a `set`
        // blocked on a full queue holds that lock until the worker makes room.
        self.shared.gate.drain();

        let Some(sender) = self.submitter.lock().sender.take() else {
            return Ok(());
        };

        // Dropping the last sender is the shutdown signal; the worker still
        // receives everything queued before it.
        drop(sender);

        if let Some(handle) = self.worker.lock().take() {
            handle.join().map_err(|_| {
                TimeslicerError::Storage("durability worker panicked".to_string())
            })?;
        }

        self.shared.closed.store(true, Ordering::Release);
        let files = self.shared.files.lock().take();
        if let Some(mut files) = files {
            files.sync_all()?;
        }

        let health = self.health();
        tracing::info!(
            store = %self.builder.layout().name(),
            durable_writes = health.durable_writes,
            failed_writes = health.failed_writes,
            "Store closed"
        );
        Ok(())
    }

    /// Stop the worker without draining the queue
    ///
    /// Queued writes that are not durable yet are discarded, exactly as if the
    /// process had been killed. Used to exercise crash behaviour.
    pub fn abort(&self) -> Result<()> {
        self.shared.gate.abort();
        let result = self.close();
        self.shared.pending.write().clear();
        result
    }

    // =========================================================================
    // Accessors (for operators, testing and debugging)
    // =========================================================================

    /// Durability counters and the last recorded failure
    pub fn health(&self) -> StoreHealth {
        self.shared.health.snapshot(self.pending_count())
    }

    /// Number of keys with a durable index entry
    pub fn key_count(&self) -> usize {
        self.shared.index.len()
    }

    /// Number of keys whose latest value is not durable yet
    pub fn pending_count(&self) -> usize {
        self.shared.pending.read().len()
    }

    /// Durable index entry of a key
    pub fn index_entry(&self, key: &str) -> Option<IndexEntry> {
        self.shared.index.lookup(key)
    }

    /// Every durable index entry, sorted by key
    pub fn index_snapshot(&self) -> Vec<IndexEntry> {
        self.shared.index.snapshot()
    }

    /// Current size of the data log in bytes
    pub fn data_file_size(&self) -> Result<u64> {
        let files = self.shared.files.lock();
        let files = files.as_ref().ok_or(TimeslicerError::StoreClosed)?;
        Ok(files.log.size())
    }

    /// Number of records in the index file
    pub fn index_record_count(&self) -> Result<u64> {
        let files = self.shared.files.lock();
        let files = files.as_ref().ok_or(TimeslicerError::StoreClosed)?;
        Ok(files.index_file.record_count())
    }

    /// Replay numbers recorded when the store was opened
    pub fn bootstrap_summary(&self) -> &BootstrapSummary {
        &self.summary
    }

    /// Where the store files live
    pub fn layout(&self) -> &StoreLayout {
        self.builder.layout()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::error!(error = %err, "Failed to close store cleanly");
        }
    }
}

fn validate(key: &str, value: &[u8]) -> Result<()> {
    if key.len() > MAX_KEY_LEN {
        return Err(TimeslicerError::KeyTooLong {
            len: key.len(),
            max: MAX_KEY_LEN,
        });
    }
    if value.len() as u64 > u64::from(u32::MAX) {
        return Err(TimeslicerError::ValueTooLarge {
            len: value.len(),
            max: u64::from(u32::MAX),
        });
    }
    Ok(())
}
