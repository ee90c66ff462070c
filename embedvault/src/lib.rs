//! # EmbedVault
//!
//! **Store embeddings locally or in a managed vector service behind one API.**
//!
//! EmbedVault gives RAG and semantic-search code a single upsert/query contract:
//!
//! - **Local** — Exact cosine search over a crash-safe on-disk store
//! - **Pinecone** — Forwarded to a Pinecone index (collection = namespace)
//! - **Weaviate** — Forwarded to a Weaviate instance (collection = class)
//! - **Simulated** — Placeholder answers when a service is not configured
//!
//! ## Quick Start
//!
//! ```no_run
//! use embedvault::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let store = VectorStore::open("local", ProviderConfig::new().with_db_path("./vectordb"))?;
//!
//!     store.upsert("articles", &[
//!         VectorRecord::new("rust-intro", vec![0.9, 0.1, 0.0])
//!             .with_metadata(Metadata::new().with_field("title", "Introduction to Rust")),
//!         VectorRecord::new("py-intro", vec![0.1, 0.9, 0.0])
//!             .with_metadata(Metadata::new().with_field("title", "Introduction to Python")),
//!     ])?;
//!
//!     let results = store.query("articles", &[1.0, 0.0, 0.0], 1)?;
//!     assert_eq!(results[0].id, "rust-intro");
//!
//!     store.flush()?;
//!     Ok(())
//! }
//! ```
//!
//! ### Provider From the Environment
//!
//! [`VectorStore::from_env`] reads `PINECONE_API_KEY`, `PINECONE_INDEX_HOST`,
//! `WEAVIATE_URL`, `WEAVIATE_API_KEY` and `EMBEDVAULT_DB_PATH`. A remote
//! provider whose settings are missing is served by the simulated backend,
//! and a warning is logged once when the store is opened:
//!
//! ```rust
//! use embedvault::prelude::*;
//!
//! let store = VectorStore::open("pinecone", ProviderConfig::new()).unwrap();
//! assert!(store.is_simulated());
//!
//! let results = store.query_default("docs", &[0.1, 0.2]).unwrap();
//! assert_eq!(results[0].id, "simulated_match");
//! ```
//!
//! ## Crate Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | Enables `AsyncVectorStore` for tokio compatibility |
//!
//! ## Architecture
//!
//! - **`embedvault-core`** — Storage, engine, providers, registry
//! - **`embedvault`** — Main crate that re-exports everything
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`](crate::Result), which uses
//! the [`Error`] enum for error types. Remote service failures are not
//! errors: they are logged and answered with the simulated response.
//!
//! ## Thread Safety
//!
//! - [`VectorStore`], [`LocalEngine`] and [`DurableStore`] are `Send + Sync`
//!   and take `&self` for every operation
//! - `AsyncVectorStore` is `Clone` and safe to share across tasks

// Re-export everything from core
pub use embedvault_core::*;
