//! Context-free convenience pool
//!
//! Caps concurrency for plain async tasks that need no instance state.

use std::future::Future;

use super::pool::{Pool, PoolStatus};
use crate::config::PoolConfig;
use crate::error::SubmitError;
use crate::instance::EmptyInstance;
use crate::reliability::RetryPolicy;

/// A pool of [`EmptyInstance`]s that limits how many tasks run at once
///
/// # Example
///
/// ```
/// use instance_pool::TaskPool;
///
/// # tokio_test::block_on(async {
/// let pool = TaskPool::with_max_instances(2);
///
/// let sum = pool.submit(|| async { Ok::<_, ()>(1 + 2) }).await.unwrap();
/// assert_eq!(sum, 3);
///
/// assert!(pool.shutdown().await);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TaskPool {
    pool: Pool<EmptyInstance>,
}

impl TaskPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            pool: Pool::new(config, || async { Ok::<_, anyhow::Error>(EmptyInstance) }),
        }
    }

    pub fn with_max_instances(max_instances: usize) -> Self {
        Self::new(PoolConfig::new(max_instances))
    }

    /// Run `task` once a slot is free
    pub async fn submit<F, Fut, R, E>(&self, task: F) -> Result<R, SubmitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.pool.submit(|_| task()).await
    }

    /// Run `task` once a slot is free, overriding the retry policy
    pub async fn submit_with_retry<F, Fut, R, E>(
        &self,
        task: F,
        policy: &RetryPolicy,
    ) -> Result<R, SubmitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.pool.submit_with_retry(|_| task(), policy).await
    }

    pub async fn shutdown(&self) -> bool {
        self.pool.shutdown().await
    }

    pub async fn shutdown_with_retry(&self, policy: &RetryPolicy) -> bool {
        self.pool.shutdown_with_retry(policy).await
    }

    pub async fn shutdown_now(&self) -> bool {
        self.pool.shutdown_now().await
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Number of tasks currently running
    pub fn busy_count(&self) -> usize {
        self.pool.busy_count()
    }

    /// The underlying instance pool
    pub fn inner(&self) -> &Pool<EmptyInstance> {
        &self.pool
    }
}
