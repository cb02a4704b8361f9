//! Error types for the instance pool

use thiserror::Error;

/// Errors raised by the pool itself
#[derive(Debug, Error)]
pub enum PoolError {
    /// Submission attempted while the pool is draining
    #[error("Cannot submit new tasks because the cluster is shutting down")]
    ShuttingDown,

    /// Submission attempted after the pool terminated
    #[error("Cannot submit new tasks because the cluster has been shutdown")]
    Shutdown,

    /// Every instance is busy and the pool is at capacity
    #[error("No free instance available")]
    NoFreeInstance,

    /// Graceful shutdown is still waiting on busy instances
    #[error("{0} instances still in use")]
    InstancesInUse(usize),

    /// The instance factory failed
    #[error("Failed to create instance: {0}")]
    Creation(#[source] anyhow::Error),
}

impl PoolError {
    /// Whether the pool's backoff loop should try again after this error
    ///
    /// Only the lifecycle errors stop immediately. A full pool, busy
    /// instances during shutdown and factory failures are all retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PoolError::ShuttingDown | PoolError::Shutdown)
    }
}

/// Error returned by [`Pool::submit`](crate::Pool::submit)
///
/// Keeps pool failures apart from the task's own error, which is passed
/// through untouched.
#[derive(Debug, Error)]
pub enum SubmitError<E> {
    /// No instance could be acquired for the task
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The task itself failed
    #[error("{0}")]
    Task(E),
}

impl<E> SubmitError<E> {
    /// The task's error, if the task ran and failed
    pub fn into_task_error(self) -> Option<E> {
        match self {
            SubmitError::Task(e) => Some(e),
            SubmitError::Pool(_) => None,
        }
    }

    /// The pool error, if the task never ran
    pub fn as_pool_error(&self) -> Option<&PoolError> {
        match self {
            SubmitError::Pool(e) => Some(e),
            SubmitError::Task(_) => None,
        }
    }
}
