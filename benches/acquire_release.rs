use criterion::{Criterion, criterion_group, criterion_main};
use slotpool::{PoolConfiguration, ResourceManager, async_trait, create_pool};
use std::convert::Infallible;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

struct Ids(AtomicU64);

#[async_trait]
impl ResourceManager for Ids {
    type Resource = u64;
    type Error = Infallible;

    async fn create(&self) -> Result<u64, Infallible> {
        Ok(self.0.fetch_add(1, Ordering::Relaxed))
    }

    async fn destroy(&self, _id: u64) -> Result<(), Infallible> {
        Ok(())
    }
}

fn bench_acquire_release(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (pool, admin) = create_pool(Ids(AtomicU64::new(0)), PoolConfiguration::new().with_max_count(16))
        .unwrap()
        .into_parts();
    rt.block_on(admin.warmup(16)).unwrap();
    let pool = &pool;

    c.bench_function("acquire_release_idle", |b| {
        b.to_async(&rt).iter(|| async move {
            let id = pool.acquire().await.unwrap();
            pool.release(black_box(id)).unwrap();
        })
    });

    c.bench_function("acquire_release_concurrent_8", |b| {
        b.to_async(&rt).iter(|| async move {
            let ids = futures::future::join_all((0..8).map(|_| pool.acquire())).await;
            for id in ids {
                pool.release(id.unwrap()).unwrap();
            }
        })
    });
}

fn bench_eviction(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (pool, admin) = create_pool(Ids(AtomicU64::new(0)), PoolConfiguration::new())
        .unwrap()
        .into_parts();
    let admin = &admin;

    c.bench_function("evict_64_idle", |b| {
        b.to_async(&rt).iter(|| async move {
            admin.warmup(64).await.unwrap();
            let report = admin.run_eviction(Duration::ZERO).await;
            black_box(report.resources_deleted);
        })
    });
    drop(pool);
}

criterion_group!(benches, bench_acquire_release, bench_eviction);
criterion_main!(benches);
