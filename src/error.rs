//! Error types for Timeslicer
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TimeslicerError
pub type Result<T> = std::result::Result<T, TimeslicerError>;

/// Unified error type for Timeslicer operations
#[derive(Debug, Error)]
pub enum TimeslicerError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Bootstrap Errors (fatal, the store refuses to serve)
    // -------------------------------------------------------------------------
    #[error("Store bootstrap failed: {0}")]
    Bootstrap(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Malformed index record: {0}")]
    MalformedRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key is {len} bytes, maximum is {max}")]
    KeyTooLong { len: usize, max: usize },

    #[error("Value is {len} bytes, maximum is {max}")]
    ValueTooLarge { len: usize, max: u64 },

    // -------------------------------------------------------------------------
    // Engine Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Store is closed")]
    StoreClosed,

    #[error("Store is degraded after a failed sync: {0}")]
    StoreDegraded(String),

    #[error("Durability worker is paused")]
    WorkerPaused,

    // -------------------------------------------------------------------------
    // Request Errors
    // -------------------------------------------------------------------------
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for TimeslicerError {
    fn from(err: bincode::Error) -> Self {
        TimeslicerError::Serialization(err.to_string())
    }
}
