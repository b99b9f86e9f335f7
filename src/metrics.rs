//! Metrics collection and export for resource pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::slots::SlotCounts;

/// Snapshot of pool counters and slot occupancy
///
/// # Examples
///
/// ```
/// # use slotpool::{create_pool, PoolConfiguration, ResourceManager};
/// # use std::convert::Infallible;
/// # struct Numbers;
/// # #[slotpool::async_trait]
/// # impl ResourceManager for Numbers {
/// #     type Resource = u32;
/// #     type Error = Infallible;
/// #     async fn create(&self) -> Result<u32, Infallible> { Ok(1) }
/// #     async fn destroy(&self, _: u32) -> Result<(), Infallible> { Ok(()) }
/// # }
/// # #[tokio::main]
/// # async fn main() {
/// let (pool, admin) = create_pool(Numbers, PoolConfiguration::new()).unwrap().into_parts();
///
/// let resource = pool.acquire().await.unwrap();
/// let metrics = admin.metrics();
/// assert_eq!(metrics.total_created, 1);
/// assert_eq!(metrics.busy_resources, 1);
/// # pool.release(resource).unwrap();
/// # }
/// ```
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PoolMetrics {
    /// Successful acquisitions
    pub total_acquired: usize,

    /// Acquisitions served by an idle resource
    pub total_reused: usize,

    /// Resources created
    pub total_created: usize,

    /// Failed creation callbacks
    pub creation_failures: usize,

    /// Successful releases
    pub total_released: usize,

    /// Acquisitions rejected at capacity
    pub pool_full_events: usize,

    /// Resources removed by eviction
    pub total_evicted: usize,

    /// Failed destroy callbacks
    pub destroy_failures: usize,

    /// Waits performed by the retry decorator
    pub retry_waits: usize,

    /// Idle resources
    pub free_resources: usize,

    /// Checked-out resources
    pub busy_resources: usize,

    /// Creations in flight
    pub reserved_slots: usize,

    /// Capacity ceiling, if any
    pub max_count: Option<usize>,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_reused".to_string(), self.total_reused.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("creation_failures".to_string(), self.creation_failures.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("pool_full_events".to_string(), self.pool_full_events.to_string());
        metrics.insert("total_evicted".to_string(), self.total_evicted.to_string());
        metrics.insert("destroy_failures".to_string(), self.destroy_failures.to_string());
        metrics.insert("retry_waits".to_string(), self.retry_waits.to_string());
        metrics.insert("free_resources".to_string(), self.free_resources.to_string());
        metrics.insert("busy_resources".to_string(), self.busy_resources.to_string());
        metrics.insert("reserved_slots".to_string(), self.reserved_slots.to_string());
        if let Some(max) = self.max_count {
            metrics.insert("max_count".to_string(), max.to_string());
        }
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "prometheus")]
pub struct MetricsExporter;

#[cfg(feature = "prometheus")]
impl MetricsExporter {
    /// Render metrics in Prometheus text exposition format
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> Result<String, prometheus::Error> {
        use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            labels.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let registry = Registry::new_custom(Some("slotpool".to_string()), Some(labels))?;

        let gauges = [
            ("resources_free", "Idle resources", metrics.free_resources),
            ("resources_busy", "Checked-out resources", metrics.busy_resources),
            ("slots_reserved", "Creations in flight", metrics.reserved_slots),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::with_opts(Opts::new(name, help))?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let counters = [
            ("acquired_total", "Successful acquisitions", metrics.total_acquired),
            ("reused_total", "Acquisitions served by an idle resource", metrics.total_reused),
            ("created_total", "Resources created", metrics.total_created),
            ("creation_failures_total", "Failed creation callbacks", metrics.creation_failures),
            ("released_total", "Successful releases", metrics.total_released),
            ("pool_full_total", "Acquisitions rejected at capacity", metrics.pool_full_events),
            ("evicted_total", "Resources removed by eviction", metrics.total_evicted),
            ("destroy_failures_total", "Failed destroy callbacks", metrics.destroy_failures),
            ("retry_waits_total", "Retry decorator waits", metrics.retry_waits),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(Opts::new(name, help))?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub total_acquired: AtomicUsize,
    pub total_reused: AtomicUsize,
    pub total_created: AtomicUsize,
    pub creation_failures: AtomicUsize,
    pub total_released: AtomicUsize,
    pub pool_full_events: AtomicUsize,
    pub total_evicted: AtomicUsize,
    pub destroy_failures: AtomicUsize,
    pub retry_waits: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, counts: SlotCounts, max_count: Option<usize>) -> PoolMetrics {
        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_reused: self.total_reused.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            creation_failures: self.creation_failures.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            pool_full_events: self.pool_full_events.load(Ordering::Relaxed),
            total_evicted: self.total_evicted.load(Ordering::Relaxed),
            destroy_failures: self.destroy_failures.load(Ordering::Relaxed),
            retry_waits: self.retry_waits.load(Ordering::Relaxed),
            free_resources: counts.free,
            busy_resources: counts.busy,
            reserved_slots: counts.reserved,
            max_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reads_counters() {
        let tracker = MetricsTracker::new();
        MetricsTracker::incr(&tracker.total_acquired);
        MetricsTracker::add(&tracker.total_evicted, 3);

        let counts = SlotCounts { free: 2, busy: 1, reserved: 0 };
        let metrics = tracker.get_metrics(counts, Some(4));
        assert_eq!(metrics.total_acquired, 1);
        assert_eq!(metrics.total_evicted, 3);

        let exported = metrics.export();
        assert_eq!(exported["free_resources"], "2");
        assert_eq!(exported["max_count"], "4");
    }

    #[cfg(feature = "prometheus")]
    #[test]
    fn test_prometheus_export() {
        let metrics = PoolMetrics {
            total_created: 5,
            busy_resources: 2,
            ..Default::default()
        };
        let mut tags = HashMap::new();
        tags.insert("service".to_string(), "api".to_string());

        let output = MetricsExporter::export_prometheus(&metrics, "db", Some(&tags)).unwrap();
        assert!(output.contains("slotpool_created_total"));
        assert!(output.contains("pool=\"db\""));
        assert!(output.contains("service=\"api\""));
    }
}
