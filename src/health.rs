//! Health summary for resource pools

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::slots::SlotCounts;

/// Health status of a resource pool
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Share of `max_count` in use (0.0 to 1.0), 0.0 for unbounded pools
    pub utilization: f64,

    pub free_resources: usize,

    pub busy_resources: usize,

    pub reserved_slots: usize,

    pub max_count: Option<usize>,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    pub(crate) fn new(counts: SlotCounts, max_count: Option<usize>) -> Self {
        let in_use = counts.occupied_or_reserved();
        let utilization = match max_count {
            Some(max) if max > 0 => in_use as f64 / max as f64,
            _ => 0.0,
        };

        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", utilization * 100.0));
            is_healthy = false;
        }

        if max_count == Some(0) {
            warnings.push("Pool has zero capacity".to_string());
            is_healthy = false;
        }

        if counts.free == 0 && counts.busy > 0 {
            warnings.push("No idle resources".to_string());
        }

        Self {
            is_healthy,
            utilization,
            free_resources: counts.free,
            busy_resources: counts.busy,
            reserved_slots: counts.reserved,
            max_count,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}
