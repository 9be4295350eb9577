//! # Timeslicer
//!
//! A personal activity tracker. A day is cut into fixed-length slices, each
//! slice can be tagged with an activity, and days are served over HTTP.
//!
//! Underneath sits a small embedded key-value store:
//! - Append-only data log for values
//! - Fixed-width index file, patched in place per key
//! - In-memory index rebuilt from the index file at startup
//! - One durability worker that owns all file writes
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HTTP (axum) / CLI                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │            DaySlicer  →  SliceStore (bincode values)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get / set
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │   pending cache + InMemoryIndex        ──queue──▶  worker    │
//! └─────────────────────┬──────────────────────────────┬────────┘
//!                       │ read                         │ append / patch
//!                       ▼                              ▼
//!   ┌─────────────────────────────┐      ┌─────────────────────────────┐
//!   │   <name>.db  (RecordLog)    │      │  <name>.index  (IndexFile)  │
//!   └─────────────────────────────┘      └─────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod storage;
pub mod bootstrap;
pub mod engine;

pub mod value;
pub mod store;
pub mod slicer;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TimeslicerError};
pub use config::{AppConfig, Config};
pub use engine::{Engine, StoreHealth};
pub use store::{SliceStore, Store};
pub use slicer::DaySlicer;
pub use value::Slices;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Timeslicer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
