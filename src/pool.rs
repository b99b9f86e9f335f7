//! Acquire/release engine and the caller-facing pool handle

use crate::admin::PoolAdministration;
use crate::config::{EqualityFn, PoolConfiguration};
use crate::errors::{PoolError, PoolResult};
use crate::manager::ResourceManager;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::retry::{self, RetryPolicy};
use crate::slots::{Slot, SlotCounts, SlotStore, Ticket};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// State shared by a [`Pool`] and its [`PoolAdministration`].
///
/// The slot lock is only taken for synchronous scan-and-transition steps and
/// is never held across an `.await`.
pub(crate) struct PoolInner<M: ResourceManager> {
    pub(crate) manager: M,
    pub(crate) slots: Mutex<SlotStore<M::Resource>>,
    pub(crate) equality: EqualityFn<M::Resource>,
    pub(crate) metrics: MetricsTracker,
}

/// Returns a reservation to `Empty` unless the creation completed
struct Reservation<'a, M: ResourceManager> {
    inner: &'a PoolInner<M>,
    ticket: Ticket,
    armed: bool,
}

impl<M: ResourceManager> Reservation<'_, M> {
    fn complete(mut self, slot_state: Slot<M::Resource>) {
        self.armed = false;
        let filled = self.inner.slots.lock().fill(self.ticket, slot_state);
        // only the armed guard cancels a ticket, and eviction never touches
        // reserved slots
        debug_assert!(filled, "reservation {} missing on completion", self.ticket);
    }
}

impl<M: ResourceManager> Drop for Reservation<'_, M> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.slots.lock().cancel(self.ticket);
        }
    }
}

impl<M: ResourceManager> PoolInner<M> {
    fn new(manager: M, config: PoolConfiguration<M::Resource>) -> Self {
        Self {
            manager,
            slots: Mutex::new(SlotStore::new(config.min_count, config.max_count)),
            equality: config.equality,
            metrics: MetricsTracker::new(),
        }
    }

    pub(crate) async fn acquire(&self) -> PoolResult<M::Resource> {
        let reservation = {
            let mut slots = self.slots.lock();
            if let Some(resource) = slots.claim_free() {
                MetricsTracker::incr(&self.metrics.total_reused);
                MetricsTracker::incr(&self.metrics.total_acquired);
                tracing::debug!("reusing idle resource");
                return Ok(resource);
            }
            self.reserve_locked(&mut slots)?
        };

        let resource = self.create_into(reservation, |resource| Slot::Busy { resource }).await?;
        MetricsTracker::incr(&self.metrics.total_acquired);
        Ok(resource)
    }

    /// Reserve a slot for a creation, or fail if the pool is at capacity
    fn reserve_locked(&self, slots: &mut SlotStore<M::Resource>) -> PoolResult<Reservation<'_, M>> {
        if !slots.has_capacity() {
            MetricsTracker::incr(&self.metrics.pool_full_events);
            tracing::debug!(max_count = ?slots.max_count(), "pool is full");
            return Err(PoolError::PoolFull);
        }
        let ticket = slots.reserve();
        tracing::trace!(ticket, "slot reserved");
        Ok(Reservation {
            inner: self,
            ticket,
            armed: true,
        })
    }

    /// Run the creation callback for `reservation` and store the result
    async fn create_into<F>(
        &self,
        reservation: Reservation<'_, M>,
        slot_state: F,
    ) -> PoolResult<M::Resource>
    where
        F: FnOnce(M::Resource) -> Slot<M::Resource>,
    {
        match self.manager.create().await {
            Ok(resource) => {
                MetricsTracker::incr(&self.metrics.total_created);
                tracing::debug!(ticket = reservation.ticket, "resource created");
                reservation.complete(slot_state(resource.clone()));
                Ok(resource)
            }
            Err(err) => {
                MetricsTracker::incr(&self.metrics.creation_failures);
                tracing::warn!(ticket = reservation.ticket, error = %err, "resource creation failed");
                drop(reservation);
                Err(PoolError::creation(err))
            }
        }
    }

    pub(crate) fn release(&self, resource: M::Resource) -> PoolResult<()> {
        let released = self
            .slots
            .lock()
            .mark_free(&resource, |a, b| (self.equality)(a, b), Instant::now());

        if !released {
            tracing::debug!("release of a resource not checked out from this pool");
            return Err(PoolError::NotPartOfPool);
        }
        MetricsTracker::incr(&self.metrics.total_released);
        tracing::trace!("resource released");
        Ok(())
    }

    /// Pre-create up to `count` idle resources
    pub(crate) async fn warmup(&self, count: usize) -> PoolResult<usize> {
        let mut created = 0;
        while created < count {
            let reservation = {
                let mut slots = self.slots.lock();
                match self.reserve_locked(&mut slots) {
                    Ok(reservation) => reservation,
                    Err(PoolError::PoolFull) => break,
                    Err(err) => return Err(err),
                }
            };
            let result = self
                .create_into(reservation, |resource| Slot::Free {
                    resource,
                    returned_at: Instant::now(),
                })
                .await;
            if let Err(err) = result {
                tracing::warn!(requested = count, created, error = %err, "warmup stopped by creation failure");
                return Err(err);
            }
            created += 1;
        }
        tracing::debug!(requested = count, created, "warmup finished");
        Ok(created)
    }

    pub(crate) fn counts(&self) -> SlotCounts {
        self.slots.lock().counts()
    }

    pub(crate) fn get_metrics(&self) -> PoolMetrics {
        let slots = self.slots.lock();
        self.metrics.get_metrics(slots.counts(), slots.max_count())
    }
}

/// Caller-facing pool handle
///
/// Cloning is cheap; clones share the same slots. The handle gives no access
/// to administrative operations, see [`PoolAdministration`].
pub struct Pool<M: ResourceManager> {
    inner: Arc<PoolInner<M>>,
    retry: Option<RetryPolicy>,
}

impl<M: ResourceManager> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry: self.retry.clone(),
        }
    }
}

impl<M: ResourceManager> Pool<M> {
    /// Get a resource, reusing an idle one or creating a new one.
    ///
    /// Fails with [`PoolError::PoolFull`] at capacity, [`PoolError::Creation`]
    /// when the manager fails, or [`PoolError::RetriesExhausted`] when a
    /// retry policy is set and gives up.
    pub async fn acquire(&self) -> PoolResult<M::Resource> {
        match &self.retry {
            None => self.inner.acquire().await,
            Some(policy) => {
                retry::retry_with_hook(
                    policy,
                    || self.inner.acquire(),
                    || MetricsTracker::incr(&self.inner.metrics.retry_waits),
                )
                .await
            }
        }
    }

    /// Hand a resource back to the pool
    pub fn release(&self, resource: M::Resource) -> PoolResult<()> {
        self.inner.release(resource)
    }

    /// Handle whose `acquire` retries with `policy`.
    ///
    /// Any retry already set on this handle is replaced, not stacked.
    pub fn with_retry(&self, policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry: Some(policy),
        }
    }

    /// Handle without retry decoration
    pub fn without_retry(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry: None,
        }
    }

    /// Retry policy applied by this handle's `acquire`, if any
    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry.as_ref()
    }
}

/// The two handles produced by [`create_pool`]
pub struct PoolPair<M: ResourceManager> {
    pub pool: Pool<M>,
    pub administration: PoolAdministration<M>,
}

impl<M: ResourceManager> PoolPair<M> {
    /// Split into `(pool, administration)`
    pub fn into_parts(self) -> (Pool<M>, PoolAdministration<M>) {
        (self.pool, self.administration)
    }
}

/// Build a pool and its administration handle.
///
/// Fails with [`PoolError::InvalidConfiguration`] when `max_count` is lower
/// than `min_count`.
///
/// # Examples
///
/// ```
/// use slotpool::{async_trait, create_pool, PoolConfiguration, ResourceManager};
/// use std::convert::Infallible;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// struct Ids(AtomicU32);
///
/// #[async_trait]
/// impl ResourceManager for Ids {
///     type Resource = u32;
///     type Error = Infallible;
///
///     async fn create(&self) -> Result<u32, Infallible> {
///         Ok(self.0.fetch_add(1, Ordering::SeqCst))
///     }
///
///     async fn destroy(&self, _id: u32) -> Result<(), Infallible> {
///         Ok(())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = PoolConfiguration::new().with_max_count(4);
/// let (pool, admin) = create_pool(Ids(AtomicU32::new(0)), config).unwrap().into_parts();
///
/// let id = pool.acquire().await.unwrap();
/// pool.release(id).unwrap();
/// assert_eq!(pool.acquire().await.unwrap(), id);
/// assert_eq!(admin.current_resource_count(), 1);
/// # }
/// ```
pub fn create_pool<M: ResourceManager>(
    manager: M,
    config: PoolConfiguration<M::Resource>,
) -> PoolResult<PoolPair<M>> {
    config.validate()?;
    tracing::debug!(
        min_count = config.min_count,
        max_count = ?config.max_count,
        retry = config.retry.is_some(),
        "creating pool"
    );

    let retry = config.retry.clone();
    let inner = Arc::new(PoolInner::new(manager, config));
    Ok(PoolPair {
        pool: Pool {
            inner: Arc::clone(&inner),
            retry,
        },
        administration: PoolAdministration::new(inner),
    })
}
