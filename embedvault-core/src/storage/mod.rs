//! Durable storage for vector records.
//!
//! This module provides:
//! - Checksummed frame encoding for `(collection, id, vector, metadata)` records
//! - An append-only log with an in-memory key directory and explicit compaction

pub mod frame;
pub mod store;

pub use frame::StoredRecord;
pub use store::{CompactionStats, DurableStore, FORMAT_VERSION};
