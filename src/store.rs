//! Slice store
//!
//! Typed access to days of slices on top of the byte-level [`Engine`].

use parking_lot::Mutex;

use crate::engine::{Engine, StoreHealth};
use crate::error::Result;
use crate::value::{decode_slices, encode_slices, Slices};

/// What the day slicer and the HTTP layer need from storage
pub trait Store: Send + Sync {
    /// Slices stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Slices>>;

    /// Replace the slices stored under `key`
    fn set(&self, key: &str, slices: &Slices) -> Result<()>;

    /// Set one slice's activity and re-persist the day.
    ///
    /// Returns `false` when the day or the slice label does not exist.
    fn set_slice(&self, key: &str, slice: &str, activity: &str) -> Result<bool>;

    /// Slices stored under `key`, storing `slices` first if the key is absent
    fn get_or_insert(&self, key: &str, slices: Slices) -> Result<Slices>;
}

/// [`Store`] backed by the persistent engine
pub struct SliceStore {
    engine: Engine,

    /// Serializes read-modify-write in `set_slice` against other writers
    write_lock: Mutex<()>,
}

impl SliceStore {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            write_lock: Mutex::new(()),
        }
    }

    /// Underlying engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn health(&self) -> StoreHealth {
        self.engine.health()
    }

    /// Drain pending writes and release the store files
    pub fn close(&self) -> Result<()> {
        self.engine.close()
    }

    fn put(&self, key: &str, slices: &Slices) -> Result<()> {
        let bytes = encode_slices(slices)?;
        self.engine.set(key, bytes)
    }
}

impl Store for SliceStore {
    fn get(&self, key: &str) -> Result<Option<Slices>> {
        match self.engine.get(key)? {
            Some(bytes) => Ok(Some(decode_slices(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, slices: &Slices) -> Result<()> {
        let _guard = self.write_lock.lock();
        self.put(key, slices)
    }

    fn set_slice(&self, key: &str, slice: &str, activity: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let Some(mut slices) = self.get(key)? else {
            return Ok(false);
        };
        match slices.get_mut(slice) {
            Some(current) => *current = activity.to_string(),
            None => return Ok(false),
        }

        self.put(key, &slices)?;
        Ok(true)
    }

    fn get_or_insert(&self, key: &str, slices: Slices) -> Result<Slices> {
        let _guard = self.write_lock.lock();

        if let Some(existing) = self.get(key)? {
            return Ok(existing);
        }
        self.put(key, &slices)?;
        Ok(slices)
    }
}
