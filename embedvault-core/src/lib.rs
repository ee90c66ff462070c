//! # EmbedVault Core
//!
//! Core library for EmbedVault: embedding storage and similarity search
//! behind one upsert/query contract, served locally or by a managed vector
//! service.
//!
//! ## Crate Features
//!
//! - `async` - Enables [`AsyncVectorStore`] for tokio-compatible async operations
//!
//! ## Core Types
//!
//! ### Backends
//!
//! - [`LocalEngine`] - Exact cosine-similarity search over the durable store
//! - [`PineconeAdapter`] / [`WeaviateAdapter`] - Managed vector services
//! - [`SimulatedAdapter`] - Placeholder responses when a service is not configured
//! - [`VectorStore`] - Facade that resolves one backend from a provider name
//!
//! ### Persistence
//!
//! - [`DurableStore`] - Append-only checksummed log keyed by `(collection, id)`
//! - [`ModelRegistry`] - Versioned model artifacts on top of the durable store
//!
//! ### Types
//!
//! - [`VectorRecord`] - Id, vector and metadata as handed to `upsert`
//! - [`QueryResult`] - Id, score and metadata as returned by `query`
//! - [`Metadata`] - JSON object attached to each record
//! - [`ProviderConfig`] / [`Settings`] - Explicit and environment configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod similarity;
pub mod storage;
pub mod store;
pub mod vector;

// Re-exports for convenient access
pub use config::{ProviderConfig, Settings, StoreConfig, SyncMode};
pub use engine::LocalEngine;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use provider::{
    PineconeAdapter, ProviderKind, SimulatedAdapter, VectorBackend, WeaviateAdapter,
};
pub use registry::{ModelRegistry, ModelVersion};
pub use similarity::cosine_similarity;
pub use storage::{CompactionStats, DurableStore};
#[cfg(feature = "async")]
pub use store::AsyncVectorStore;
pub use store::{Backend, VectorStore};
pub use vector::{QueryResult, VectorRecord, DEFAULT_TOP_K};

/// Re-export commonly used types for convenience.
///
/// # Example
///
/// ```rust
/// use embedvault_core::prelude::*;
///
/// let store = VectorStore::open("simulated", ProviderConfig::new()).unwrap();
/// let record = VectorRecord::new("a", vec![1.0, 2.0, 3.0])
///     .with_metadata(Metadata::new().with_field("key", "value"));
/// assert_eq!(store.upsert("docs", &[record]).unwrap(), 1);
/// ```
pub mod prelude {
    pub use crate::{
        Error, LocalEngine, Metadata, ProviderConfig, ProviderKind, QueryResult, Result,
        StoreConfig, SyncMode, VectorBackend, VectorRecord, VectorStore, DEFAULT_TOP_K,
    };
}
