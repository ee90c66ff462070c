//! Provider-agnostic vector store.
//!
//! [`VectorStore`] resolves its backend exactly once, when it is opened, and
//! keeps it for its whole lifetime. A remote provider whose required settings
//! are missing is replaced by a [`SimulatedAdapter`] at that point, so callers
//! never need to handle "not configured" themselves.

use tracing::{info, warn};

use crate::config::{
    ProviderConfig, Settings, ENV_PINECONE_API_KEY, ENV_PINECONE_INDEX_HOST, ENV_WEAVIATE_URL,
};
use crate::engine::LocalEngine;
use crate::error::Result;
use crate::provider::{
    PineconeAdapter, ProviderKind, SimulatedAdapter, VectorBackend, WeaviateAdapter,
};
use crate::vector::{QueryResult, VectorRecord, DEFAULT_TOP_K};

/// The one backend a store forwards to.
#[derive(Debug)]
pub enum Backend {
    Local(LocalEngine),
    Pinecone(PineconeAdapter),
    Weaviate(WeaviateAdapter),
    Simulated(SimulatedAdapter),
}

impl Backend {
    /// Builds the backend for `kind` from an already merged configuration.
    pub fn build(kind: ProviderKind, config: &ProviderConfig) -> Result<Self> {
        match kind {
            ProviderKind::Local => Ok(Backend::Local(LocalEngine::open(config.store_config())?)),
            ProviderKind::Pinecone => match (config.api_key.as_deref(), config.url.as_deref()) {
                (Some(key), Some(host)) => Ok(Backend::Pinecone(PineconeAdapter::new(
                    key,
                    host,
                    config.timeout,
                )?)),
                (key, _) => {
                    let missing = if key.is_none() {
                        ENV_PINECONE_API_KEY
                    } else {
                        ENV_PINECONE_INDEX_HOST
                    };
                    Ok(Self::simulated_for(kind, missing))
                }
            },
            ProviderKind::Weaviate => match config.url.as_deref() {
                Some(url) => Ok(Backend::Weaviate(WeaviateAdapter::new(
                    url,
                    config.api_key.as_deref(),
                    config.timeout,
                )?)),
                None => Ok(Self::simulated_for(kind, ENV_WEAVIATE_URL)),
            },
            ProviderKind::Simulated => Ok(Backend::Simulated(SimulatedAdapter::new())),
        }
    }

    fn simulated_for(kind: ProviderKind, missing: &str) -> Self {
        warn!(
            provider = %kind,
            missing,
            "provider is not configured, using simulated responses"
        );
        Backend::Simulated(SimulatedAdapter::standing_in_for(kind))
    }

    fn as_backend(&self) -> &dyn VectorBackend {
        match self {
            Backend::Local(engine) => engine,
            Backend::Pinecone(adapter) => adapter,
            Backend::Weaviate(adapter) => adapter,
            Backend::Simulated(adapter) => adapter,
        }
    }
}

impl VectorBackend for Backend {
    fn kind(&self) -> ProviderKind {
        self.as_backend().kind()
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        self.as_backend().upsert(collection, records)
    }

    fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        self.as_backend().query(collection, vector, top_k)
    }
}

/// Stores and queries embeddings through one of the supported backends.
///
/// # Example
///
/// ```no_run
/// use embedvault_core::{Metadata, ProviderConfig, VectorRecord, VectorStore};
///
/// let store = VectorStore::open(
///     "local",
///     ProviderConfig::new().with_db_path("./vectordb"),
/// ).unwrap();
///
/// store.upsert("docs", &[
///     VectorRecord::new("intro", vec![0.1, 0.9])
///         .with_metadata(Metadata::new().with_field("title", "Introduction")),
/// ]).unwrap();
///
/// for hit in store.query_default("docs", &[0.1, 0.8]).unwrap() {
///     println!("{} {:.3}", hit.id, hit.score);
/// }
/// ```
#[derive(Debug)]
pub struct VectorStore {
    requested: ProviderKind,
    backend: Backend,
}

impl VectorStore {
    /// Opens a store for `provider` using only the explicit `config`.
    ///
    /// Fails with [`Error::UnknownProvider`](crate::Error::UnknownProvider)
    /// for an unrecognized identifier, with a storage error when the local
    /// store cannot be opened, and with a config error when remote settings
    /// are present but unusable.
    pub fn open(provider: &str, config: ProviderConfig) -> Result<Self> {
        let requested: ProviderKind = provider.parse()?;
        let backend = Backend::build(requested, &config)?;

        info!(requested = %requested, backend = %backend.kind(), "opened vector store facade");
        Ok(Self { requested, backend })
    }

    /// Opens a store for `provider`, filling unset values from the environment.
    pub fn from_env(provider: &str) -> Result<Self> {
        Self::with_settings(provider, &Settings::from_env(), ProviderConfig::new())
    }

    /// Opens a store for `provider` with `explicit` values layered over `settings`.
    pub fn with_settings(provider: &str, settings: &Settings, explicit: ProviderConfig) -> Result<Self> {
        let requested: ProviderKind = provider.parse()?;
        Self::open(provider, settings.provider_config(requested, explicit))
    }

    /// Wraps an already built backend.
    pub fn from_backend(requested: ProviderKind, backend: Backend) -> Self {
        Self { requested, backend }
    }

    /// Inserts or replaces `records` in `collection`; returns the count written.
    pub fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        self.backend.upsert(collection, records)
    }

    /// Returns up to `top_k` matches for `vector`, best first.
    pub fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        self.backend.query(collection, vector, top_k)
    }

    /// [`query`](Self::query) with [`DEFAULT_TOP_K`] results.
    pub fn query_default(&self, collection: &str, vector: &[f32]) -> Result<Vec<QueryResult>> {
        self.query(collection, vector, DEFAULT_TOP_K)
    }

    /// The backend actually serving calls.
    pub fn kind(&self) -> ProviderKind {
        self.backend.kind()
    }

    /// The provider named when the store was opened.
    pub fn requested(&self) -> ProviderKind {
        self.requested
    }

    /// True when calls are answered by the simulated backend.
    pub fn is_simulated(&self) -> bool {
        matches!(self.backend, Backend::Simulated(_))
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// The local engine, when this store is backed by one.
    pub fn local(&self) -> Option<&LocalEngine> {
        match &self.backend {
            Backend::Local(engine) => Some(engine),
            _ => None,
        }
    }

    /// Forces buffered local writes to disk. No-op for other backends.
    pub fn flush(&self) -> Result<()> {
        match &self.backend {
            Backend::Local(engine) => engine.store().flush(),
            _ => Ok(()),
        }
    }
}

// Async API when tokio feature is enabled
#[cfg(feature = "async")]
mod async_api {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;

    fn join_error(e: tokio::task::JoinError) -> Error {
        Error::TaskJoin(format!("spawn_blocking failed: {}", e))
    }

    /// Async wrapper for [`VectorStore`].
    ///
    /// Every call runs on tokio's blocking pool via `spawn_blocking`, so file
    /// and HTTP I/O never stall the async executor.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use embedvault_core::{AsyncVectorStore, ProviderConfig, VectorRecord};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let store = AsyncVectorStore::open("local", ProviderConfig::new()).await.unwrap();
    ///
    ///     store.upsert("docs", vec![VectorRecord::new("a", vec![1.0, 0.0])]).await.unwrap();
    ///     let results = store.query("docs", &[1.0, 0.0], 5).await.unwrap();
    /// }
    /// ```
    #[derive(Clone)]
    pub struct AsyncVectorStore {
        inner: Arc<VectorStore>,
    }

    impl AsyncVectorStore {
        /// Opens a store asynchronously.
        pub async fn open(provider: &str, config: ProviderConfig) -> Result<Self> {
            let provider = provider.to_string();
            let store = tokio::task::spawn_blocking(move || VectorStore::open(&provider, config))
                .await
                .map_err(join_error)??;

            Ok(Self::from_sync(store))
        }

        /// Opens a store asynchronously with environment defaults.
        pub async fn from_env(provider: &str) -> Result<Self> {
            let provider = provider.to_string();
            let store = tokio::task::spawn_blocking(move || VectorStore::from_env(&provider))
                .await
                .map_err(join_error)??;

            Ok(Self::from_sync(store))
        }

        /// Wraps an existing store.
        pub fn from_sync(store: VectorStore) -> Self {
            Self {
                inner: Arc::new(store),
            }
        }

        /// Upserts records asynchronously.
        pub async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<usize> {
            let inner = Arc::clone(&self.inner);
            let collection = collection.to_string();
            tokio::task::spawn_blocking(move || inner.upsert(&collection, &records))
                .await
                .map_err(join_error)?
        }

        /// Queries asynchronously.
        pub async fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
            let inner = Arc::clone(&self.inner);
            let collection = collection.to_string();
            let vector = vector.to_vec();
            tokio::task::spawn_blocking(move || inner.query(&collection, &vector, top_k))
                .await
                .map_err(join_error)?
        }

        /// Queries asynchronously with [`DEFAULT_TOP_K`] results.
        pub async fn query_default(&self, collection: &str, vector: &[f32]) -> Result<Vec<QueryResult>> {
            self.query(collection, vector, DEFAULT_TOP_K).await
        }

        /// Flushes buffered local writes asynchronously.
        pub async fn flush(&self) -> Result<()> {
            let inner = Arc::clone(&self.inner);
            tokio::task::spawn_blocking(move || inner.flush())
                .await
                .map_err(join_error)?
        }

        pub fn kind(&self) -> ProviderKind {
            self.inner.kind()
        }

        pub fn is_simulated(&self) -> bool {
            self.inner.is_simulated()
        }

        /// Returns reference to the inner sync store.
        pub fn inner(&self) -> &VectorStore {
            &self.inner
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_async_simulated_store() {
            let store = AsyncVectorStore::open("simulated", ProviderConfig::new())
                .await
                .unwrap();
            let clone = store.clone();

            let written = clone
                .upsert("docs", vec![VectorRecord::new("a", vec![1.0])])
                .await
                .unwrap();
            assert_eq!(written, 1);

            let results = store.query_default("docs", &[1.0]).await.unwrap();
            assert_eq!(results, SimulatedAdapter::placeholder(1));
            assert!(store.is_simulated());
        }

        #[tokio::test]
        async fn test_async_unknown_provider() {
            let result = AsyncVectorStore::open("chroma", ProviderConfig::new()).await;
            assert!(matches!(result, Err(Error::UnknownProvider(_))));
        }
    }
}

#[cfg(feature = "async")]
pub use async_api::AsyncVectorStore;
