//! Persistence demonstration.
//!
//! This example shows how to:
//! 1. Upsert records into the local store
//! 2. Close and reopen (simulating restart)
//! 3. Replace a record and compact the log

use embedvault::prelude::*;

fn open(path: &std::path::Path) -> Result<VectorStore> {
    VectorStore::open("local", ProviderConfig::new().with_db_path(path))
}

fn main() -> Result<()> {
    let db_path = std::env::temp_dir().join("embedvault_persistence_demo");
    let _ = std::fs::remove_dir_all(&db_path);

    println!("📥 Phase 1: writing records...");
    {
        let store = open(&db_path)?;
        store.upsert(
            "notes",
            &[
                VectorRecord::new("a", vec![1.0, 0.0, 0.0]),
                VectorRecord::new("b", vec![0.0, 1.0, 0.0]),
                VectorRecord::new("c", vec![0.0, 0.0, 1.0]),
            ],
        )?;
        store.flush()?;
    }

    println!("🔄 Phase 2: reopening after 'restart'...");
    let store = open(&db_path)?;
    let engine = store.local().expect("local provider builds a local engine");
    println!("   {} records in 'notes'", engine.store().collection_len("notes"));

    println!("✏️  Phase 3: replacing 'b' and compacting...");
    store.upsert("notes", &[VectorRecord::new("b", vec![1.0, 1.0, 0.0])])?;
    let stats = engine.store().compact()?;
    println!(
        "   kept {} records, {} -> {} bytes",
        stats.live_records, stats.bytes_before, stats.bytes_after
    );

    for hit in store.query("notes", &[1.0, 0.0, 0.0], 3)? {
        println!("   {} {:.4}", hit.id, hit.score);
    }

    let _ = std::fs::remove_dir_all(&db_path);
    println!("\n✅ Persistence verified");
    Ok(())
}
