//! Network Module
//!
//! HTTP endpoints over the slice store.
//!
//! ## Routes
//! - `GET  /dayslice/{timestamp}`          day of a unix timestamp, created on first access
//! - `PUT  /dayslice/{timestamp}/{slice}`  body `{"activity": "..."}`
//! - `GET  /health`                        durability counters

mod handlers;
mod server;

pub use server::{router, serve, AppState};
