use std::collections::HashSet;
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};

use embedvault_core::similarity::{cosine_similarity, dot, norm};
use embedvault_core::{LocalEngine, StoreConfig, SyncMode, VectorRecord};
use proptest::prelude::*;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

proptest! {
    #[test]
    fn test_cosine_within_bounds(
        a in proptest::collection::vec(-100.0f32..100.0f32, 1..64),
        b in proptest::collection::vec(-100.0f32..100.0f32, 1..64)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        match cosine_similarity(a, b) {
            Ok(score) => prop_assert!((-1.0..=1.0).contains(&score)),
            // Only zero vectors are unscorable here.
            Err(_) => prop_assert!(norm(a) == 0.0 || norm(b) == 0.0),
        }
    }

    #[test]
    fn test_cosine_matches_naive(
        a in proptest::collection::vec(-1.0f32..1.0f32, 1..100),
        b in proptest::collection::vec(-1.0f32..1.0f32, 1..100)
    ) {
        let len = std::cmp::min(a.len(), b.len());
        let a = &a[..len];
        let b = &b[..len];

        // Skip near-zero vectors
        if dot(a, a) < 1e-6 || dot(b, b) < 1e-6 {
            return Ok(());
        }

        let naive_dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let naive_norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let naive_norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let naive = naive_dot / (naive_norm_a * naive_norm_b);

        let score = cosine_similarity(a, b).unwrap();
        prop_assert!((score - f64::from(naive)).abs() < 1e-3);
    }

    #[test]
    fn test_cosine_is_symmetric(
        a in proptest::collection::vec(-1.0f32..1.0f32, 8),
        b in proptest::collection::vec(-1.0f32..1.0f32, 8)
    ) {
        match (cosine_similarity(&a, &b), cosine_similarity(&b, &a)) {
            (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "symmetric inputs disagreed on scorability"),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_query_returns_each_scorable_record_once_sorted(
        vectors in proptest::collection::vec(
            proptest::collection::vec(-1.0f32..1.0f32, 4),
            0..40
        ),
        query in proptest::collection::vec(-1.0f32..1.0f32, 4),
        top_k in 0usize..60
    ) {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir()
            .join("embedvault_prop")
            .join(format!("prop_{}_{}", std::process::id(), id));
        let _ = fs::remove_dir_all(&path);

        let engine = LocalEngine::open(StoreConfig::new(&path).with_sync_mode(SyncMode::NoSync)).unwrap();
        let records: Vec<VectorRecord> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| VectorRecord::new(format!("r{}", i), v.clone()))
            .collect();
        engine.upsert("prop", &records).unwrap();

        let scorable = records
            .iter()
            .filter(|r| cosine_similarity(&query, &r.values).is_ok())
            .count();

        let results = engine.query("prop", &query, top_k).unwrap();
        prop_assert_eq!(results.len(), std::cmp::min(top_k, scorable));

        for pair in results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }

        let unique: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(unique.len(), results.len());

        let _ = fs::remove_dir_all(&path);
    }
}
