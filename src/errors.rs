//! Error types for the resource pool

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error produced by a [`ResourceManager`](crate::ResourceManager) callback.
pub type BoxDynError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PoolError {
    #[error("Pool is at maximum capacity")]
    PoolFull,

    #[error("Resource is not checked out from this pool")]
    NotPartOfPool,

    #[error("Resource creation failed: {0}")]
    Creation(#[source] BoxDynError),

    #[error("Acquire failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<PoolError>,
    },

    #[error("max_count ({max_count}) must not be lower than min_count ({min_count})")]
    InvalidConfiguration { min_count: usize, max_count: usize },
}

impl PoolError {
    /// Wrap a callback error as a creation failure
    pub fn creation<E>(err: E) -> Self
    where
        E: Into<BoxDynError>,
    {
        PoolError::Creation(err.into())
    }

    /// Whether this error signals capacity pressure
    pub fn is_pool_full(&self) -> bool {
        matches!(self, PoolError::PoolFull)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_exhausted_keeps_cause() {
        let err = PoolError::RetriesExhausted {
            attempts: 3,
            source: Box::new(PoolError::PoolFull),
        };

        assert_eq!(
            err.to_string(),
            "Acquire failed after 3 attempts: Pool is at maximum capacity"
        );
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "Pool is at maximum capacity");
    }

    #[test]
    fn test_creation_wraps_message() {
        let err = PoolError::creation("socket refused");
        assert!(!err.is_pool_full());
        assert_eq!(err.to_string(), "Resource creation failed: socket refused");
    }
}
