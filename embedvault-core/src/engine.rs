//! Exact nearest-neighbor search over the durable store.
//!
//! Every query scans the whole collection and scores each record with cosine
//! similarity. There is no index structure, so results have 100% recall.

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::provider::{ProviderKind, VectorBackend};
use crate::similarity::cosine_similarity;
use crate::storage::DurableStore;
use crate::vector::{QueryResult, VectorRecord};

/// Brute-force similarity engine backed by a [`DurableStore`].
///
/// # Example
///
/// ```no_run
/// use embedvault_core::{LocalEngine, StoreConfig, VectorRecord};
///
/// let engine = LocalEngine::open(StoreConfig::new("./vectors")).unwrap();
/// engine
///     .upsert("docs", &[
///         VectorRecord::new("a", vec![1.0, 0.0, 0.0]),
///         VectorRecord::new("b", vec![0.0, 1.0, 0.0]),
///     ])
///     .unwrap();
///
/// let results = engine.query("docs", &[1.0, 0.0, 0.0], 1).unwrap();
/// assert_eq!(results[0].id, "a");
/// ```
#[derive(Debug)]
pub struct LocalEngine {
    store: DurableStore,
}

impl LocalEngine {
    /// Opens the durable store described by `config`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Ok(Self::new(DurableStore::open(config)?))
    }

    pub fn new(store: DurableStore) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &DurableStore {
        &self.store
    }

    /// Writes each record in order and returns how many were written.
    ///
    /// The call is not atomic across records. If a write fails, the records
    /// before it stay committed and the error is returned.
    pub fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        for (written, record) in records.iter().enumerate() {
            if let Err(e) = self.store.put(collection, record) {
                warn!(
                    collection,
                    committed = written,
                    failed_id = %record.id,
                    error = %e,
                    "upsert stopped partway"
                );
                return Err(e);
            }
        }

        debug!(collection, count = records.len(), "upserted records");
        Ok(records.len())
    }

    /// Returns the `top_k` records most similar to `vector`, best first.
    ///
    /// Records whose similarity is undefined are skipped rather than failing
    /// the query: those whose length differs from `vector`'s, and those where
    /// either vector has zero magnitude. Equal scores keep scan order, which is
    /// the order the records were last written.
    pub fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let records = self.store.scan(collection)?;
        let scanned = records.len();

        let mut results: Vec<QueryResult> = records
            .into_iter()
            .filter_map(|record| match cosine_similarity(vector, &record.values) {
                Ok(score) => Some(QueryResult::new(record.id, score, record.metadata)),
                Err(reason) => {
                    debug!(collection, id = %record.id, %reason, "skipping unscorable record");
                    None
                }
            })
            .collect();

        let skipped = scanned - results.len();
        if skipped > 0 {
            debug!(collection, skipped, scanned, "records excluded from ranking");
        }

        // Stable: ties keep scan order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }
}

impl VectorBackend for LocalEngine {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn upsert(&self, collection: &str, records: &[VectorRecord]) -> Result<usize> {
        LocalEngine::upsert(self, collection, records)
    }

    fn query(&self, collection: &str, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        LocalEngine::query(self, collection, vector, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::metadata::Metadata;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_engine_path() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("embedvault_test_engine")
            .join(format!("engine_{}_{}", std::process::id(), id));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn create_test_engine(path: &PathBuf) -> LocalEngine {
        let engine = LocalEngine::open(StoreConfig::new(path)).unwrap();
        engine
            .upsert(
                "docs",
                &[
                    VectorRecord::new("a", vec![1.0, 0.0, 0.0])
                        .with_metadata(Metadata::new().with_field("type", "x")),
                    VectorRecord::new("b", vec![0.0, 1.0, 0.0]),
                    VectorRecord::new("c", vec![1.0, 0.0, 0.0]),
                ],
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_ranking_with_ties_in_write_order() {
        let path = temp_engine_path();
        let engine = create_test_engine(&path);

        let results = engine.query("docs", &[1.0, 0.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert!((results[0].score - 1.0).abs() < 1e-12);
        assert!((results[1].score - 1.0).abs() < 1e-12);
        assert!(results[2].score.abs() < 1e-12);
        assert_eq!(results[0].metadata.get_str("type"), Some("x"));

        let _ = fs::remove_dir_all(&path);
    }

    #[test]
    fn test_top_k_limits() {
        let path = temp_engine_path();
        let engine = create_test_engine(&path);

        assert_eq!(engine.query("docs", &[1.0, 0.0, 0.0], 1).unwrap().len(), 1);
        assert_eq!(engine.query("docs", &[1.0, 0.0, 0.0], 50).unwrap().len(), 3);
        assert!(engine.query("docs", &[1.0, 0.0, 0.0], 0).unwrap().is_empty());

        let _ = fs::remove_dir_all(&path);
    }

    #[test]
    fn test_skips_mismatched_and_zero_vectors() {
        let path = temp_engine_path();
        let engine = LocalEngine::open(StoreConfig::new(&path)).unwrap();
        engine
            .upsert(
                "mixed",
                &[
                    VectorRecord::new("three", vec![1.0, 0.0, 0.0]),
                    VectorRecord::new("two", vec![0.6, 0.8]),
                    VectorRecord::new("zero", vec![0.0, 0.0]),
                ],
            )
            .unwrap();

        let results = engine.query("mixed", &[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "two");
        assert!((results[0].score - 0.6).abs() < 1e-6);

        // A zero query scores nothing, without failing.
        assert!(engine.query("mixed", &[0.0, 0.0], 10).unwrap().is_empty());

        let _ = fs::remove_dir_all(&path);
    }

    #[test]
    fn test_replace_changes_ranking() {
        let path = temp_engine_path();
        let engine = create_test_engine(&path);

        engine
            .upsert("docs", &[VectorRecord::new("b", vec![1.0, 0.1, 0.0])])
            .unwrap();

        let results = engine.query("docs", &[0.0, 1.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "b");
        assert!(results[0].score < 0.2);
        assert_eq!(engine.store().collection_len("docs"), 3);

        let _ = fs::remove_dir_all(&path);
    }

    #[test]
    fn test_upsert_is_not_atomic() {
        let path = temp_engine_path();
        let engine = LocalEngine::open(StoreConfig::new(&path)).unwrap();

        let result = engine.upsert(
            "docs",
            &[
                VectorRecord::new("first", vec![1.0]),
                VectorRecord::new("", vec![1.0]),
                VectorRecord::new("third", vec![1.0]),
            ],
        );
        assert!(matches!(result, Err(Error::InvalidRecord(_))));
        assert_eq!(engine.store().ids("docs"), vec!["first"]);

        let _ = fs::remove_dir_all(&path);
    }

    #[test]
    fn test_query_empty_collection() {
        let path = temp_engine_path();
        let engine = LocalEngine::open(StoreConfig::new(&path)).unwrap();
        assert!(engine.query("nothing", &[1.0], 5).unwrap().is_empty());
        let _ = fs::remove_dir_all(&path);
    }
}
