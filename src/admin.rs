//! Administrative view of a pool

use std::sync::Arc;

use crate::errors::PoolResult;
use crate::eviction::{EvictionReport, IdlePolicy};
use crate::health::HealthStatus;
use crate::manager::ResourceManager;
use crate::metrics::PoolMetrics;
use crate::pool::PoolInner;

#[cfg(feature = "prometheus")]
use crate::metrics::MetricsExporter;
#[cfg(feature = "prometheus")]
use std::collections::HashMap;

/// Operator handle returned next to the [`Pool`](crate::Pool).
///
/// It can inspect and sweep the pool but cannot acquire or release, and the
/// pool handle cannot reach any of these operations.
pub struct PoolAdministration<M: ResourceManager> {
    inner: Arc<PoolInner<M>>,
}

impl<M: ResourceManager> Clone for PoolAdministration<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: ResourceManager> PoolAdministration<M> {
    pub(crate) fn new(inner: Arc<PoolInner<M>>) -> Self {
        Self { inner }
    }

    /// Resources currently held by the pool, including creations in flight
    pub fn current_resource_count(&self) -> usize {
        self.inner.counts().occupied_or_reserved()
    }

    /// Positional eviction floor
    pub fn min_count(&self) -> usize {
        self.inner.slots.lock().min_count()
    }

    /// Capacity ceiling, `None` when unbounded
    pub fn max_count(&self) -> Option<usize> {
        self.inner.slots.lock().max_count()
    }

    /// Evict idle resources accepted by `policy`.
    ///
    /// Never fails; `destroy` errors are collected in the report.
    ///
    /// # Examples
    ///
    /// ```
    /// # use slotpool::{async_trait, create_pool, IdlePolicy, PoolConfiguration, ResourceManager};
    /// # use std::convert::Infallible;
    /// # use std::time::Duration;
    /// # struct Numbers;
    /// # #[async_trait]
    /// # impl ResourceManager for Numbers {
    /// #     type Resource = u32;
    /// #     type Error = Infallible;
    /// #     async fn create(&self) -> Result<u32, Infallible> { Ok(1) }
    /// #     async fn destroy(&self, _: u32) -> Result<(), Infallible> { Ok(()) }
    /// # }
    /// # #[tokio::main]
    /// # async fn main() {
    /// let (pool, admin) = create_pool(Numbers, PoolConfiguration::new()).unwrap().into_parts();
    /// let resource = pool.acquire().await.unwrap();
    /// pool.release(resource).unwrap();
    ///
    /// let report = admin.run_eviction(Duration::ZERO).await;
    /// assert_eq!(report.resources_deleted, 1);
    /// assert!(report.errors.is_empty());
    /// # }
    /// ```
    pub async fn run_eviction<P>(&self, policy: P) -> EvictionReport
    where
        P: Into<IdlePolicy<M::Resource>>,
    {
        self.inner.run_eviction(&policy.into()).await
    }

    /// Pre-create up to `count` idle resources, stopping at `max_count`.
    ///
    /// Returns how many were created; the first creation failure is returned
    /// as an error.
    pub async fn warmup(&self, count: usize) -> PoolResult<usize> {
        self.inner.warmup(count).await
    }

    /// Snapshot of the pool counters
    pub fn metrics(&self) -> PoolMetrics {
        self.inner.get_metrics()
    }

    /// Utilization and warnings derived from the current slots
    pub fn health_status(&self) -> HealthStatus {
        let slots = self.inner.slots.lock();
        HealthStatus::new(slots.counts(), slots.max_count())
    }

    /// Export metrics in Prometheus text format
    #[cfg(feature = "prometheus")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> Result<String, prometheus::Error> {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }
}
