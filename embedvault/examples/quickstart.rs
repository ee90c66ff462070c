//! Quickstart: store a handful of embeddings locally and query them.
//!
//! Run with: cargo run --example quickstart

use embedvault::prelude::*;

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let db_path = std::env::temp_dir().join("embedvault_quickstart");
    let _ = std::fs::remove_dir_all(&db_path);

    println!("🌟 EmbedVault Quickstart\n");

    let store = VectorStore::open("local", ProviderConfig::new().with_db_path(&db_path))?;

    let docs = [
        ("rust-basics", "Rust programming basics", [0.9, 0.8, 0.1, 0.0]),
        ("rust-advanced", "Advanced Rust patterns", [0.85, 0.9, 0.15, 0.05]),
        ("python-ds", "Python data science", [0.1, 0.2, 0.9, 0.85]),
        ("ml", "Machine learning", [0.2, 0.1, 0.7, 0.8]),
    ];

    let records: Vec<VectorRecord> = docs
        .iter()
        .map(|(id, title, embedding)| {
            VectorRecord::new(*id, embedding.to_vec())
                .with_metadata(Metadata::new().with_field("title", *title))
        })
        .collect();

    let written = store.upsert("articles", &records)?;
    println!("📥 Upserted {} records", written);

    let query = [0.88, 0.85, 0.1, 0.0];
    println!("\n🔍 Top 3 matches for a Rust-flavored query:");
    for (i, hit) in store.query("articles", &query, 3)?.iter().enumerate() {
        println!(
            "   {}. {} (score: {:.4}) {}",
            i + 1,
            hit.id,
            hit.score,
            hit.metadata.get_str("title").unwrap_or("")
        );
    }

    store.flush()?;
    let _ = std::fs::remove_dir_all(&db_path);

    println!("\n✅ Done");
    Ok(())
}
