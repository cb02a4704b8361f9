//! Instances: the reusable state a task runs against
//!
//! User types implement `Instance` to describe their teardown; the pool wraps
//! each one in a `PooledInstance` that carries the busy flag.

use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

/// Reusable state that pooled tasks execute against
///
/// The pool calls [`Instance::shutdown`] exactly once per instance, during
/// pool shutdown. All instances are shut down concurrently and a failure
/// in one does not prevent the others from shutting down.
#[async_trait]
pub trait Instance: Send + Sync + 'static {
    /// Release whatever the instance holds
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// An instance without a payload, for tasks that need no context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyInstance;

impl Instance for EmptyInstance {}

/// An instance carrying an arbitrary value with no special teardown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueInstance<V> {
    value: V,
}

impl<V> ValueInstance<V> {
    pub fn new(value: V) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_inner(self) -> V {
        self.value
    }
}

impl<V> Deref for ValueInstance<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.value
    }
}

impl<V: Send + Sync + 'static> Instance for ValueInstance<V> {}

/// Creates instances on demand
///
/// Implemented for any `Fn() -> impl Future<Output = anyhow::Result<T>>`,
/// so most callers pass an async closure.
#[async_trait]
pub trait InstanceFactory<T>: Send + Sync + 'static {
    async fn create(&self) -> anyhow::Result<T>;
}

#[async_trait]
impl<T, F, Fut> InstanceFactory<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    async fn create(&self) -> anyhow::Result<T> {
        (self)().await
    }
}

/// An instance owned by a pool, together with its busy flag
#[derive(Debug)]
pub struct PooledInstance<T> {
    id: usize,
    value: Arc<T>,
    busy: AtomicBool,
}

impl<T> PooledInstance<T> {
    pub(crate) fn new(id: usize, value: T, busy: bool) -> Self {
        Self {
            id,
            value: Arc::new(value),
            busy: AtomicBool::new(busy),
        }
    }

    /// Position of this instance in creation order
    pub fn id(&self) -> usize {
        self.id
    }

    /// True when no task holds this instance
    pub fn is_free(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// Mark busy if currently free; returns whether the claim succeeded
    pub(crate) fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Plain flag write, safe to call after the pool has terminated
    pub(crate) fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }
}
