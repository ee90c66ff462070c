//! Async API demo using AsyncVectorStore.
//!
//! Run with: cargo run --example async_demo --features async

use embedvault::prelude::*;
#[cfg(feature = "async")]
use embedvault::AsyncVectorStore;

#[cfg(feature = "async")]
#[tokio::main]
async fn main() -> Result<()> {
    println!("Async EmbedVault Demo\n");

    let temp_dir = std::env::temp_dir().join("embedvault_async_demo");
    let _ = std::fs::remove_dir_all(&temp_dir);

    let store = AsyncVectorStore::open("local", ProviderConfig::new().with_db_path(&temp_dir)).await?;

    println!("⏳ Upserting 100 batches concurrently...");
    let start = std::time::Instant::now();

    let mut handles = vec![];
    for batch in 0..100 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let records: Vec<VectorRecord> = (0..10)
                .map(|i| {
                    let n = batch * 10 + i;
                    let v: Vec<f32> = (0..64).map(|j| ((n * 64 + j) as f32).sin()).collect();
                    VectorRecord::new(format!("v{}", n), v)
                })
                .collect();
            store.upsert("vectors", records).await
        }));
    }

    let mut written = 0;
    for handle in handles {
        written += handle
            .await
            .map_err(|e| Error::TaskJoin(e.to_string()))??;
    }
    println!("   {} records in {:?}\n", written, start.elapsed());

    let query: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).cos()).collect();
    let results = store.query("vectors", &query, 5).await?;

    println!("   Top 5 results:");
    for (i, r) in results.iter().enumerate() {
        println!("     {}. {} (score: {:.4})", i + 1, r.id, r.score);
    }

    store.flush().await?;
    let _ = std::fs::remove_dir_all(&temp_dir);

    println!("\nAsync demo complete!");
    Ok(())
}

#[cfg(not(feature = "async"))]
fn main() {
    println!("Run with: cargo run --example async_demo --features async");
}
