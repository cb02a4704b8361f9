//! Connection Pool Example - Bounded pool of simulated connections
//!
//! Submits more jobs than there are connections, then shuts the pool down
//! gracefully once the work is in flight.
//!
//! Run with: RUST_LOG=instance_pool=debug cargo run -p instance-pool --example connection_pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use instance_pool::prelude::*;

/// A pretend database connection
struct Connection {
    id: usize,
}

impl Connection {
    async fn query(&self, job: usize) -> anyhow::Result<String> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(format!("job {job} ran on connection {}", self.id))
    }
}

#[async_trait]
impl Instance for Connection {
    async fn shutdown(&self) -> anyhow::Result<()> {
        println!("closing connection {}", self.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instance_pool=info".into()),
        )
        .init();

    println!("=== Connection Pool ===\n");

    let next_id = Arc::new(AtomicUsize::new(0));
    let config = PoolConfig::new(3)
        .with_name("connections")
        .with_retry(RetryPolicy::fixed(Duration::from_millis(10), 200));

    let pool: Pool<Connection> = Pool::new(config, move || {
        let next_id = Arc::clone(&next_id);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, anyhow::Error>(Connection {
                id: next_id.fetch_add(1, Ordering::SeqCst),
            })
        }
    });

    let handles: Vec<_> = (0..8)
        .map(|job| {
            let pool = pool.clone();
            tokio::spawn(async move { pool.submit(|conn| async move { conn.query(job).await }).await })
        })
        .collect();

    for handle in handles {
        match handle.await? {
            Ok(line) => println!("{line}"),
            Err(e) => println!("job failed: {e}"),
        }
    }

    println!("\nlive connections: {}", pool.size());
    println!("shutdown: {}", pool.shutdown().await);
    println!("shutdown again: {}", pool.shutdown().await);

    Ok(())
}
