//! Instance pools
//!
//! This module provides:
//! - [`Pool`] - Bounded pool of reusable instances
//! - [`TaskPool`] - Concurrency limiter for tasks that need no instance
//!
//! # Lifecycle
//!
//! ```text
//! ┌─────────┐  shutdown / shutdown_now  ┌──────────┐  instances shut down  ┌────────────┐
//! │  Ready  │ ────────────────────────► │ Draining │ ────────────────────► │ Terminated │
//! └─────────┘                           └──────────┘                       └────────────┘
//! ```
//!
//! Only `Ready` accepts submissions. A second shutdown request is a no-op
//! that returns `false`.

#[allow(clippy::module_inception)]
mod pool;
mod task_pool;

pub use pool::{InstanceGuard, Pool, PoolStatus};
pub use task_pool::TaskPool;
