//! Configuration for stores and providers.
//!
//! Explicit values always win. [`Settings`] supplies the environment-driven
//! defaults and is resolved once when a store is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::provider::ProviderKind;

/// Default location of the local store when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "./vectordb";
/// Default root of the model registry.
pub const DEFAULT_REGISTRY_PATH: &str = "./model_registry";
/// Default experiment tracking location.
pub const DEFAULT_TRACKING_URI: &str = "./mlruns";
/// Default timeout for remote vector service calls.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_DB_PATH: &str = "EMBEDVAULT_DB_PATH";
pub const ENV_REGISTRY_PATH: &str = "EMBEDVAULT_MODEL_REGISTRY";
pub const ENV_TRACKING_URI: &str = "EMBEDVAULT_TRACKING_URI";
pub const ENV_PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const ENV_PINECONE_INDEX_HOST: &str = "PINECONE_INDEX_HOST";
pub const ENV_WEAVIATE_URL: &str = "WEAVIATE_URL";
pub const ENV_WEAVIATE_API_KEY: &str = "WEAVIATE_API_KEY";

/// When appended records are forced to stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// fsync after every record (safest, slowest).
    Immediate,
    /// fsync after a batch of records.
    #[default]
    Batched,
    /// Leave syncing to the OS (fastest, recent records may be lost on power failure).
    NoSync,
}

/// Configuration for a [`DurableStore`](crate::storage::DurableStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the store files.
    pub path: PathBuf,
    /// fsync policy for appended records.
    pub sync_mode: SyncMode,
    /// Records between fsyncs under [`SyncMode::Batched`].
    pub sync_batch: usize,
}

impl StoreConfig {
    /// Creates a config for the store directory at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_mode: SyncMode::Batched,
            sync_batch: 64,
        }
    }

    /// Sets the sync mode. Chainable.
    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Sets the batch size used by [`SyncMode::Batched`]. Chainable.
    pub fn with_sync_batch(mut self, records: usize) -> Self {
        self.sync_batch = records.max(1);
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

/// Configuration bundle handed to a provider at construction.
///
/// Unset fields are filled from [`Settings`] by
/// [`VectorStore::from_env`](crate::VectorStore::from_env); a store opened
/// with [`VectorStore::open`](crate::VectorStore::open) sees only what is set
/// here.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Local store directory.
    pub db_path: Option<PathBuf>,
    /// API key of the remote service.
    pub api_key: Option<String>,
    /// Endpoint of the remote service (Pinecone index host, Weaviate URL).
    pub url: Option<String>,
    /// Per-request timeout for remote calls.
    pub timeout: Duration,
    /// fsync policy of the local store.
    pub sync_mode: SyncMode,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            api_key: None,
            url: None,
            timeout: DEFAULT_REMOTE_TIMEOUT,
            sync_mode: SyncMode::default(),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.db_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Builds the local store config, falling back to [`DEFAULT_DB_PATH`].
    pub fn store_config(&self) -> StoreConfig {
        let path = self
            .db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        StoreConfig::new(path).with_sync_mode(self.sync_mode)
    }
}

/// Environment-driven settings. Every option is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub db_path: Option<PathBuf>,
    pub registry_path: Option<PathBuf>,
    pub tracking_uri: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index_host: Option<String>,
    pub weaviate_url: Option<String>,
    pub weaviate_api_key: Option<String>,
}

impl Settings {
    /// Reads the recognized options from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the recognized options through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            db_path: get(ENV_DB_PATH).map(PathBuf::from),
            registry_path: get(ENV_REGISTRY_PATH).map(PathBuf::from),
            tracking_uri: get(ENV_TRACKING_URI),
            pinecone_api_key: get(ENV_PINECONE_API_KEY),
            pinecone_index_host: get(ENV_PINECONE_INDEX_HOST),
            weaviate_url: get(ENV_WEAVIATE_URL),
            weaviate_api_key: get(ENV_WEAVIATE_API_KEY),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    pub fn registry_path(&self) -> PathBuf {
        self.registry_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH))
    }

    pub fn tracking_uri(&self) -> &str {
        self.tracking_uri.as_deref().unwrap_or(DEFAULT_TRACKING_URI)
    }

    /// Fills the unset fields of `explicit` with the settings for `kind`.
    pub fn provider_config(&self, kind: ProviderKind, explicit: ProviderConfig) -> ProviderConfig {
        let (api_key, url) = match kind {
            ProviderKind::Pinecone => (
                self.pinecone_api_key.as_ref(),
                self.pinecone_index_host.as_ref(),
            ),
            ProviderKind::Weaviate => (self.weaviate_api_key.as_ref(), self.weaviate_url.as_ref()),
            ProviderKind::Local | ProviderKind::Simulated => (None, None),
        };

        ProviderConfig {
            db_path: explicit.db_path.or_else(|| self.db_path.clone()),
            api_key: explicit.api_key.or_else(|| api_key.cloned()),
            url: explicit.url.or_else(|| url.cloned()),
            ..explicit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings.db_path(), PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(settings.registry_path(), PathBuf::from(DEFAULT_REGISTRY_PATH));
        assert_eq!(settings.tracking_uri(), DEFAULT_TRACKING_URI);
    }

    #[test]
    fn test_settings_blank_is_unset() {
        let settings = Settings::from_lookup(lookup(&[(ENV_PINECONE_API_KEY, "  ")]));
        assert!(settings.pinecone_api_key.is_none());
    }

    #[test]
    fn test_explicit_config_wins() {
        let settings = Settings::from_lookup(lookup(&[
            (ENV_PINECONE_API_KEY, "env-key"),
            (ENV_PINECONE_INDEX_HOST, "env-host"),
        ]));

        let merged = settings.provider_config(
            ProviderKind::Pinecone,
            ProviderConfig::new().with_api_key("explicit-key"),
        );
        assert_eq!(merged.api_key.as_deref(), Some("explicit-key"));
        assert_eq!(merged.url.as_deref(), Some("env-host"));
    }

    #[test]
    fn test_provider_settings_are_scoped() {
        let settings = Settings::from_lookup(lookup(&[(ENV_WEAVIATE_URL, "http://weaviate:8080")]));

        let pinecone = settings.provider_config(ProviderKind::Pinecone, ProviderConfig::new());
        assert!(pinecone.url.is_none());

        let weaviate = settings.provider_config(ProviderKind::Weaviate, ProviderConfig::new());
        assert_eq!(weaviate.url.as_deref(), Some("http://weaviate:8080"));
    }

    #[test]
    fn test_store_config_batch_floor() {
        let config = StoreConfig::new("/tmp/x").with_sync_batch(0);
        assert_eq!(config.sync_batch, 1);
    }
}
