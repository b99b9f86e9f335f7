//! # slotpool
//!
//! Generic async resource pool. Resources are created and destroyed through a
//! [`ResourceManager`], handed out by [`Pool::acquire`] and given back with
//! [`Pool::release`].
//!
//! ## Features
//!
//! - Slot reservation before every creation, so concurrent acquisitions never
//!   race for the same slot and a failed creation frees only its own slot
//! - Optional capacity ceiling (`max_count`)
//! - Idle eviction by fixed duration or custom predicate, with a positional
//!   floor (`min_count`)
//! - Retry on capacity pressure, or a fully custom retry decision
//! - Separate administration handle for counts, eviction, warm-up, health
//!   and metrics
//! - Prometheus metrics export
//!
//! ## Quick Start
//!
//! ```rust
//! use slotpool::{async_trait, create_pool, PoolConfiguration, ResourceManager};
//! use std::io;
//! use std::time::Duration;
//!
//! struct Connections;
//!
//! #[async_trait]
//! impl ResourceManager for Connections {
//!     type Resource = String;
//!     type Error = io::Error;
//!
//!     async fn create(&self) -> Result<String, io::Error> {
//!         Ok("conn-1".to_string())
//!     }
//!
//!     async fn destroy(&self, _conn: String) -> Result<(), io::Error> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (pool, admin) = create_pool(Connections, PoolConfiguration::new().with_max_count(8))
//!     .unwrap()
//!     .into_parts();
//!
//! let conn = pool.acquire().await.unwrap();
//! println!("Got: {conn}");
//! pool.release(conn).unwrap();
//!
//! let report = admin.run_eviction(Duration::from_secs(300)).await;
//! assert_eq!(report.resources_deleted, 0);
//! # }
//! ```

mod admin;
mod config;
mod errors;
mod eviction;
mod health;
mod manager;
mod metrics;
mod pool;
mod retry;
mod slots;

pub use admin::PoolAdministration;
pub use config::{EqualityFn, PoolConfiguration};
pub use errors::{BoxDynError, PoolError, PoolResult};
pub use eviction::{EvictionReport, IdlePolicy, IdlePredicate, IdleResource};
pub use health::HealthStatus;
pub use manager::ResourceManager;
#[cfg(feature = "prometheus")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use pool::{Pool, PoolPair, create_pool};
pub use retry::{RetryDecider, RetryDecision, RetryPolicy, retry_acquire};

pub use async_trait::async_trait;
