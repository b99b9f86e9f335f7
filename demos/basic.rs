//! Basic usage of the resource pool

use slotpool::{PoolConfiguration, PoolError, ResourceManager, async_trait, create_pool};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Hands out numbered "sessions"
struct Sessions {
    next: AtomicU32,
}

#[async_trait]
impl ResourceManager for Sessions {
    type Resource = u32;
    type Error = Infallible;

    async fn create(&self) -> Result<u32, Infallible> {
        let id = self.next.fetch_add(1, Ordering::SeqCst);
        println!("   Creating session {id}");
        Ok(id)
    }

    async fn destroy(&self, id: u32) -> Result<(), Infallible> {
        println!("   Destroying session {id}");
        Ok(())
    }
}

fn sessions() -> Sessions {
    Sessions {
        next: AtomicU32::new(1),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== slotpool - Basic Examples ===\n");

    reuse().await;
    capacity().await;
    eviction().await;
}

async fn reuse() {
    println!("1. Acquire and Reuse:");
    let (pool, admin) = create_pool(sessions(), PoolConfiguration::new())
        .unwrap()
        .into_parts();

    let session = pool.acquire().await.unwrap();
    println!("   Got session {session}");
    pool.release(session).unwrap();

    let again = pool.acquire().await.unwrap();
    println!("   Got session {again} again, resources: {}\n", admin.current_resource_count());
    pool.release(again).unwrap();
}

async fn capacity() {
    println!("2. Capacity Limit:");
    let (pool, admin) = create_pool(sessions(), PoolConfiguration::new().with_max_count(2))
        .unwrap()
        .into_parts();

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    match pool.acquire().await {
        Err(PoolError::PoolFull) => println!("   Third acquire rejected: pool is full"),
        other => println!("   Unexpected: {other:?}"),
    }
    match pool.release(42) {
        Err(err) => println!("   Releasing 42: {err}"),
        Ok(()) => println!("   Released 42?"),
    }

    pool.release(a).unwrap();
    pool.release(b).unwrap();
    let health = admin.health_status();
    println!("   Utilization: {:.0}%\n", health.utilization * 100.0);
}

async fn eviction() {
    println!("3. Idle Eviction:");
    let (pool, admin) = create_pool(sessions(), PoolConfiguration::new().with_min_count(1))
        .unwrap()
        .into_parts();

    let created = admin.warmup(3).await.unwrap();
    println!("   Warmed up {created} sessions");

    let held = pool.acquire().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let report = admin.run_eviction(Duration::from_millis(10)).await;
    println!(
        "   Evicted {} sessions, {} errors, {} left",
        report.resources_deleted,
        report.errors.len(),
        admin.current_resource_count()
    );
    pool.release(held).unwrap();
}
