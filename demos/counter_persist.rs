//! End-to-end demo: a value stream with durable last-value persistence.
//!
//! Boot #1 consumes a stream of counter values and flushes at "suspend";
//! boot #2 subscribes again and receives the flushed value back, exactly
//! once.
//!
//! Run with:
//!   cargo run --example counter_persist

use anyhow::Result;
use futures::StreamExt;
use futures::channel::mpsc;
use streamvault::{PersistentStore, with_persistence};

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== StreamVault Counter Demo ===\n");

    let data_dir = std::env::temp_dir().join("streamvault_counter_demo");

    println!("1) Boot #1: consume live counter values");
    {
        let store = PersistentStore::new(&data_dir);
        let (tx, rx) = mpsc::unbounded::<u64>();
        let mut counter = with_persistence(rx, "counter", &store);

        for value in 1..=3u64 {
            tx.unbounded_send(value)?;
            let seen = counter.next().await.expect("stream is live");
            println!("   counter -> {}", seen);
        }

        println!("\n2) Suspend signal: the shell flushes pending writes");
        let report = store.flush()?;
        println!(
            "   flushed {} write(s), {} failed",
            report.attempted, report.failed
        );
    }

    println!("\n3) Boot #2: subscribing restores the last flushed value");
    {
        let store = PersistentStore::new(&data_dir);
        let (_tx, rx) = mpsc::unbounded::<u64>();
        let mut counter = with_persistence(rx, "counter", &store);

        let restored = counter.next().await.expect("restored value");
        println!("   restored -> {}", restored);
        println!("   record consumed: {}", !store.exists("counter"));
    }

    std::fs::remove_dir_all(&data_dir).ok();
    println!("\nDone.");
    Ok(())
}
