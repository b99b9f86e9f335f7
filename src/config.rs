//! Pool configuration options

use std::fmt;
use std::sync::Arc;

use crate::errors::{PoolError, PoolResult};
use crate::retry::RetryPolicy;

/// Function used by `release` to find the slot holding a returned resource
pub type EqualityFn<R> = Arc<dyn Fn(&R, &R) -> bool + Send + Sync>;

/// Configuration for pool construction
///
/// # Examples
///
/// ```
/// use slotpool::{PoolConfiguration, RetryPolicy};
/// use std::time::Duration;
///
/// let config = PoolConfiguration::<u32>::new()
///     .with_min_count(2)
///     .with_max_count(10)
///     .with_retry(RetryPolicy::fixed(3, Duration::from_millis(50)));
///
/// assert_eq!(config.min_count, 2);
/// assert_eq!(config.max_count, Some(10));
/// ```
pub struct PoolConfiguration<R> {
    /// Slots below this index are never evicted
    pub min_count: usize,

    /// Ceiling on occupied plus reserved slots, unbounded when `None`
    pub max_count: Option<usize>,

    /// Equality used to map a released resource back to its slot
    pub equality: EqualityFn<R>,

    /// Retry applied to `acquire` on the pool handle
    pub retry: Option<RetryPolicy>,
}

impl<R> Clone for PoolConfiguration<R> {
    fn clone(&self) -> Self {
        Self {
            min_count: self.min_count,
            max_count: self.max_count,
            equality: Arc::clone(&self.equality),
            retry: self.retry.clone(),
        }
    }
}

impl<R> fmt::Debug for PoolConfiguration<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("min_count", &self.min_count)
            .field("max_count", &self.max_count)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<R: PartialEq + 'static> Default for PoolConfiguration<R> {
    fn default() -> Self {
        Self::with_equality_fn(|a: &R, b: &R| a == b)
    }
}

impl<R: PartialEq + 'static> PoolConfiguration<R> {
    /// Create a new configuration comparing resources with `PartialEq`
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R> PoolConfiguration<R> {
    /// Create a configuration for resources without a usable `PartialEq`
    ///
    /// # Examples
    ///
    /// ```
    /// use slotpool::PoolConfiguration;
    /// use std::sync::Arc;
    ///
    /// struct Conn;
    ///
    /// let config = PoolConfiguration::<Arc<Conn>>::with_equality_fn(Arc::ptr_eq);
    /// assert_eq!(config.min_count, 0);
    /// ```
    pub fn with_equality_fn<F>(equality: F) -> Self
    where
        F: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        Self {
            min_count: 0,
            max_count: None,
            equality: Arc::new(equality),
            retry: None,
        }
    }

    /// Set the positional eviction floor
    pub fn with_min_count(mut self, count: usize) -> Self {
        self.min_count = count;
        self
    }

    /// Set the capacity ceiling
    pub fn with_max_count(mut self, count: usize) -> Self {
        self.max_count = Some(count);
        self
    }

    /// Replace the equality function
    pub fn with_equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        self.equality = Arc::new(equality);
        self
    }

    /// Retry failed acquisitions with the given policy
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Check the bounds, as done by [`create_pool`](crate::create_pool)
    pub fn validate(&self) -> PoolResult<()> {
        if let Some(max_count) = self.max_count
            && max_count < self.min_count
        {
            return Err(PoolError::InvalidConfiguration {
                min_count: self.min_count,
                max_count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::<i32>::new();
        assert_eq!(config.min_count, 0);
        assert_eq!(config.max_count, None);
        assert!(config.retry.is_none());
        assert!((config.equality)(&1, &1));
        assert!(!(config.equality)(&1, &2));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(PoolConfiguration::<i32>::new().with_min_count(5).validate().is_ok());
        assert!(
            PoolConfiguration::<i32>::new()
                .with_min_count(2)
                .with_max_count(2)
                .validate()
                .is_ok()
        );

        let err = PoolConfiguration::<i32>::new()
            .with_min_count(3)
            .with_max_count(1)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            PoolError::InvalidConfiguration { min_count: 3, max_count: 1 }
        ));
    }

    #[test]
    fn test_custom_equality() {
        let config = PoolConfiguration::<(u32, &'static str)>::new().with_equality(|a, b| a.0 == b.0);
        assert!((config.equality)(&(1, "a"), &(1, "b")));
    }
}
