//! Idle-resource eviction

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::errors::BoxDynError;
use crate::manager::ResourceManager;
use crate::metrics::MetricsTracker;
use crate::pool::PoolInner;

/// An idle resource offered to an [`IdlePolicy`]
#[derive(Debug)]
pub struct IdleResource<'a, R> {
    pub resource: &'a R,
    /// When the resource was last released
    pub returned_at: Instant,
    /// Time snapshot shared by the whole sweep
    pub now: Instant,
}

impl<R> IdleResource<'_, R> {
    pub fn idle_for(&self) -> Duration {
        self.now.saturating_duration_since(self.returned_at)
    }
}

/// Predicate deciding whether an idle resource is evicted
pub type IdlePredicate<R> = Arc<dyn Fn(&IdleResource<'_, R>) -> bool + Send + Sync>;

/// Rule deciding which idle resources an eviction sweep removes
///
/// # Examples
///
/// ```
/// use slotpool::IdlePolicy;
/// use std::time::Duration;
///
/// let after_a_minute = IdlePolicy::<u32>::from(Duration::from_secs(60));
/// let odd_ids_only = IdlePolicy::<u32>::predicate(|idle| *idle.resource % 2 == 1);
/// # let _ = (after_a_minute, odd_ids_only);
/// ```
pub enum IdlePolicy<R> {
    /// Evict resources idle for at least this long
    FixedDuration(Duration),

    /// Evict resources the predicate accepts
    Predicate(IdlePredicate<R>),
}

impl<R> Clone for IdlePolicy<R> {
    fn clone(&self) -> Self {
        match self {
            IdlePolicy::FixedDuration(duration) => IdlePolicy::FixedDuration(*duration),
            IdlePolicy::Predicate(predicate) => IdlePolicy::Predicate(Arc::clone(predicate)),
        }
    }
}

impl<R> fmt::Debug for IdlePolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlePolicy::FixedDuration(duration) => {
                f.debug_tuple("FixedDuration").field(duration).finish()
            }
            IdlePolicy::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<R> From<Duration> for IdlePolicy<R> {
    fn from(duration: Duration) -> Self {
        IdlePolicy::FixedDuration(duration)
    }
}

impl<R> IdlePolicy<R> {
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&IdleResource<'_, R>) -> bool + Send + Sync + 'static,
    {
        IdlePolicy::Predicate(Arc::new(predicate))
    }

    pub fn accepts(&self, idle: &IdleResource<'_, R>) -> bool {
        match self {
            IdlePolicy::FixedDuration(threshold) => idle.idle_for() >= *threshold,
            IdlePolicy::Predicate(predicate) => predicate(idle),
        }
    }
}

/// Outcome of an eviction sweep
#[derive(Debug, Default)]
pub struct EvictionReport {
    /// Resources removed from the pool, whether or not `destroy` succeeded
    pub resources_deleted: usize,

    /// Errors returned by `destroy`, empty on full success
    pub errors: Vec<BoxDynError>,
}

impl EvictionReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<M: ResourceManager> PoolInner<M> {
    /// Remove idle resources accepted by `policy` and destroy them.
    ///
    /// Slots below `min_count` are never evicted. The policy runs without the
    /// slot lock held, and evicted slots leave the sequence before any
    /// `destroy` runs.
    pub(crate) async fn run_eviction(&self, policy: &IdlePolicy<M::Resource>) -> EvictionReport {
        let (candidates, now) = {
            let slots = self.slots.lock();
            (slots.idle_candidates(), Instant::now())
        };

        let accepted: Vec<_> = candidates
            .into_iter()
            .filter(|candidate| {
                policy.accepts(&IdleResource {
                    resource: &candidate.resource,
                    returned_at: candidate.returned_at,
                    now,
                })
            })
            .collect();

        let evicted = self
            .slots
            .lock()
            .remove_idle(accepted, |a, b| (self.equality)(a, b));

        let resources_deleted = evicted.len();
        if resources_deleted == 0 {
            tracing::trace!("eviction found nothing to remove");
            return EvictionReport::default();
        }

        let results = join_all(evicted.into_iter().map(|resource| self.manager.destroy(resource))).await;
        let errors: Vec<BoxDynError> = results
            .into_iter()
            .filter_map(Result::err)
            .inspect(|err| tracing::warn!(error = %err, "failed to destroy evicted resource"))
            .map(|err| Box::new(err) as BoxDynError)
            .collect();

        MetricsTracker::add(&self.metrics.total_evicted, resources_deleted);
        MetricsTracker::add(&self.metrics.destroy_failures, errors.len());
        tracing::debug!(resources_deleted, failures = errors.len(), "eviction finished");

        EvictionReport {
            resources_deleted,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle(returned_at: Instant, now: Instant) -> IdleResource<'static, u32> {
        IdleResource {
            resource: &7,
            returned_at,
            now,
        }
    }

    #[test]
    fn test_fixed_duration_threshold() {
        let now = Instant::now();
        let policy = IdlePolicy::<u32>::from(Duration::from_secs(10));

        assert!(!policy.accepts(&idle(now, now)));
        assert!(policy.accepts(&idle(now, now + Duration::from_secs(10))));
        assert!(IdlePolicy::<u32>::FixedDuration(Duration::ZERO).accepts(&idle(now, now)));
    }

    #[test]
    fn test_predicate_sees_resource() {
        let now = Instant::now();
        let policy = IdlePolicy::predicate(|idle: &IdleResource<'_, u32>| *idle.resource == 7);
        assert!(policy.accepts(&idle(now, now)));

        let policy = IdlePolicy::predicate(|idle: &IdleResource<'_, u32>| idle.idle_for() > Duration::from_secs(1));
        assert!(!policy.accepts(&idle(now, now)));
    }
}
