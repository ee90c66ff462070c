//! Provider selection from the environment.
//!
//! Run with: cargo run --example provider_fallback -- pinecone
//!
//! Without `PINECONE_API_KEY`/`PINECONE_INDEX_HOST` (or `WEAVIATE_URL`) set,
//! the store answers with simulated results and logs why.

use embedvault::prelude::*;
use serde_json::json;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "embedvault_core=info".into()),
        )
        .try_init();

    let provider = std::env::args().nth(1).unwrap_or_else(|| "pinecone".to_string());
    let store = VectorStore::from_env(&provider)?;

    println!(
        "requested {} -> serving with {}{}",
        store.requested(),
        store.kind(),
        if store.is_simulated() { " (simulated)" } else { "" }
    );

    let metadata = Metadata::from_value(json!({"source": "demo", "lang": "en"})).unwrap_or_default();
    let written = store.upsert(
        "demo",
        &[VectorRecord::new("greeting", vec![0.1, 0.3, 0.5]).with_metadata(metadata)],
    )?;
    println!("upserted {}", written);

    for hit in store.query_default("demo", &[0.1, 0.3, 0.5])? {
        println!("{} {:.3} {}", hit.id, hit.score, serde_json::Value::from(hit.metadata));
    }
    Ok(())
}
