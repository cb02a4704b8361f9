//! # Instance Pool
//!
//! A bounded-concurrency task pool. Submitted tasks are multiplexed over at
//! most `max_instances` reusable instances, which are created on demand (or
//! eagerly) by a user-supplied factory.
//!
//! ## Features
//!
//! - **Bounded creation**: capacity is reserved before the factory is awaited,
//!   so concurrent acquirers never over-provision
//! - **Retry with backoff**: a full pool is retried under a configurable
//!   [`RetryPolicy`]; lifecycle errors fail fast
//! - **Guaranteed release**: instances return to the free set when the task
//!   settles, including on error and panic
//! - **Graceful or forced shutdown**: wait for busy instances, or shut
//!   everything down immediately
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Pool                                 │
//! │  submit(task) ──► acquire ──► task(instance) ──► release     │
//! └─────────────────────────────────────────────────────────────┘
//!            │                         ▲
//!            ▼                         │
//! ┌──────────────────────┐   ┌─────────────────────────────────┐
//! │     RetryPolicy      │   │  PooledInstance (busy flag)     │
//! │  (backoff on full)   │   │  [0] [1] [2] ... [max - 1]      │
//! └──────────────────────┘   └─────────────────────────────────┘
//!                                      ▲
//!                                      │
//!                            ┌─────────────────────┐
//!                            │   InstanceFactory   │
//!                            └─────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use instance_pool::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let pool: Pool<ValueInstance<String>> = Pool::new(PoolConfig::new(2), || async {
//!     Ok::<_, anyhow::Error>(ValueInstance::new(String::from("worker")))
//! });
//!
//! let len = pool
//!     .submit(|instance| async move { Ok::<_, anyhow::Error>(instance.len()) })
//!     .await
//!     .unwrap();
//! assert_eq!(len, 6);
//!
//! assert!(pool.shutdown().await);
//! assert!(!pool.shutdown().await);
//! # });
//! ```

pub mod config;
pub mod error;
pub mod instance;
pub mod pool;
pub mod reliability;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::PoolConfig;
    pub use crate::error::{PoolError, SubmitError};
    pub use crate::instance::{EmptyInstance, Instance, InstanceFactory, ValueInstance};
    pub use crate::pool::{InstanceGuard, Pool, PoolStatus, TaskPool};
    pub use crate::reliability::RetryPolicy;
}

// Re-export key types at crate root
pub use config::PoolConfig;
pub use error::{PoolError, SubmitError};
pub use instance::{EmptyInstance, Instance, InstanceFactory, ValueInstance};
pub use pool::{InstanceGuard, Pool, PoolStatus, TaskPool};
pub use reliability::{retry, RetryPolicy};
