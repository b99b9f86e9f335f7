//! Concurrent acquisition, retry and metrics

use slotpool::{PoolConfiguration, ResourceManager, RetryDecision, RetryPolicy, async_trait, create_pool};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
struct Connection {
    id: usize,
}

/// Simulated connection factory where every third connect fails
struct Connector {
    attempts: AtomicUsize,
}

#[async_trait]
impl ResourceManager for Connector {
    type Resource = Arc<Connection>;
    type Error = io::Error;

    async fn create(&self) -> Result<Arc<Connection>, io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(5)).await;
        if attempt % 3 == 2 {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        Ok(Arc::new(Connection { id: attempt }))
    }

    async fn destroy(&self, conn: Arc<Connection>) -> Result<(), io::Error> {
        println!("   Closing connection {}", conn.id);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== slotpool - Async Examples ===\n");

    let config = PoolConfiguration::with_equality_fn(Arc::ptr_eq)
        .with_max_count(3)
        .with_retry(RetryPolicy::fixed(20, Duration::from_millis(10)));
    let (pool, admin) = create_pool(
        Connector {
            attempts: AtomicUsize::new(0),
        },
        config,
    )
    .unwrap()
    .into_parts();

    println!("1. Concurrent Access:");
    let handles: Vec<_> = (0..8)
        .map(|task| {
            let pool = pool.clone();
            tokio::spawn(async move {
                match pool.acquire().await {
                    Ok(conn) => {
                        println!("   Task {task} got connection {}", conn.id);
                        sleep(Duration::from_millis(20)).await;
                        pool.release(conn).unwrap();
                    }
                    Err(err) => println!("   Task {task} failed: {err}"),
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    println!("   Resources: {}\n", admin.current_resource_count());

    println!("2. Custom Retry:");
    let impatient = pool.with_retry(RetryPolicy::custom(|error, attempt| {
        if attempt < 2 {
            RetryDecision::RetryAfter(Duration::from_millis(1))
        } else {
            RetryDecision::Fail(error)
        }
    }));
    let held: Vec<_> = futures::future::join_all((0..3).map(|_| pool.acquire())).await;
    match impatient.acquire().await {
        Ok(conn) => println!("   Unexpectedly got {}", conn.id),
        Err(err) => println!("   Gave up: {err}"),
    }
    for conn in held.into_iter().flatten() {
        pool.release(conn).unwrap();
    }
    println!();

    println!("3. Eviction and Metrics:");
    let report = admin.run_eviction(Duration::ZERO).await;
    println!("   Evicted {}", report.resources_deleted);
    for (key, value) in admin.metrics().export() {
        println!("   {key}: {value}");
    }
    match admin.export_metrics_prometheus("demo", None) {
        Ok(text) => println!("\n{text}"),
        Err(err) => println!("   Prometheus export failed: {err}"),
    }
}
