//! Bounded instance pool
//!
//! Multiplexes submitted tasks over at most `max_instances` reusable
//! instances, with graceful and forceful shutdown.

use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, SubmitError};
use crate::instance::{Instance, InstanceFactory, PooledInstance};
use crate::reliability::{retry, RetryPolicy};

/// Pool lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Accepting submissions
    Ready,
    /// Shutdown requested; rejecting submissions while instances wind down
    Draining,
    /// Every instance has been shut down
    Terminated,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Draining => write!(f, "draining"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

struct PoolState<T> {
    status: PoolStatus,
    /// Live instances in creation order
    instances: Vec<Arc<PooledInstance<T>>>,
    /// Creations reserved against capacity but not yet resolved
    pending: usize,
    /// Set once forced shutdown has snapshotted the instance set
    sealed: bool,
    next_id: usize,
}

impl<T> PoolState<T> {
    fn busy_count(&self) -> usize {
        self.instances.iter().filter(|i| !i.is_free()).count()
    }
}

struct PoolInner<T> {
    name: String,
    max_instances: usize,
    factory: Box<dyn InstanceFactory<T>>,
    retry: RetryPolicy,
    state: Mutex<PoolState<T>>,
}

/// A bounded pool of reusable instances
///
/// Cloning is cheap and yields another handle to the same pool.
///
/// # Example
///
/// ```ignore
/// use instance_pool::{Pool, PoolConfig, ValueInstance};
///
/// let pool = Pool::new(PoolConfig::new(4), || async {
///     Ok(ValueInstance::new(connect().await?))
/// });
///
/// let rows = pool
///     .submit(|conn| async move { conn.query("select 1").await })
///     .await?;
///
/// pool.shutdown().await;
/// ```
pub struct Pool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Pool")
            .field("name", &self.inner.name)
            .field("max_instances", &self.inner.max_instances)
            .field("status", &state.status)
            .field("size", &state.instances.len())
            .field("pending", &state.pending)
            .finish()
    }
}

impl<T: Instance> Pool<T> {
    /// Create a new pool
    ///
    /// With `eager_instances` set, creation of every instance starts right
    /// away on the current tokio runtime.
    pub fn new<F>(config: PoolConfig, factory: F) -> Self
    where
        F: InstanceFactory<T>,
    {
        let pool = Self {
            inner: Arc::new(PoolInner {
                name: config.name,
                max_instances: config.max_instances.max(1),
                factory: Box::new(factory),
                retry: config.retry,
                state: Mutex::new(PoolState {
                    status: PoolStatus::Ready,
                    instances: Vec::new(),
                    pending: 0,
                    sealed: false,
                    next_id: 0,
                }),
            }),
        };

        info!(
            pool = %pool.inner.name,
            max_instances = pool.inner.max_instances,
            eager = config.eager_instances,
            "Created instance pool"
        );

        if config.eager_instances {
            pool.spawn_eager_creations();
        }

        pool
    }

    /// Create a lazily populated pool with default settings
    pub fn with_max_instances<F>(max_instances: usize, factory: F) -> Self
    where
        F: InstanceFactory<T>,
    {
        Self::new(PoolConfig::new(max_instances), factory)
    }

    /// Run `task` against a pooled instance using the default retry policy
    pub async fn submit<F, Fut, R, E>(&self, task: F) -> Result<R, SubmitError<E>>
    where
        F: FnOnce(Arc<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.submit_with_retry(task, &self.inner.retry).await
    }

    /// Run `task` against a pooled instance, overriding the retry policy
    /// for this call only
    ///
    /// The instance is released once the task settles, whether it returned
    /// an error or panicked. The task's result is returned unchanged.
    pub async fn submit_with_retry<F, Fut, R, E>(
        &self,
        task: F,
        policy: &RetryPolicy,
    ) -> Result<R, SubmitError<E>>
    where
        F: FnOnce(Arc<T>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let guard = self.acquire_with_retry(policy).await?;
        let result = task(guard.instance()).await;
        drop(guard);
        result.map_err(SubmitError::Task)
    }

    /// Acquire an instance using the default retry policy
    pub async fn acquire(&self) -> Result<InstanceGuard<T>, PoolError> {
        self.acquire_with_retry(&self.inner.retry).await
    }

    /// Acquire an instance, retrying under `policy` while the pool is full
    ///
    /// Factory failures are retried too. Lifecycle errors never are.
    #[instrument(skip_all, fields(pool = %self.inner.name))]
    pub async fn acquire_with_retry(
        &self,
        policy: &RetryPolicy,
    ) -> Result<InstanceGuard<T>, PoolError> {
        retry(policy, PoolError::is_retryable, move |_| self.try_acquire()).await
    }

    /// Gracefully shut down using the default retry policy
    pub async fn shutdown(&self) -> bool {
        self.shutdown_with_retry(&self.inner.retry).await
    }

    /// Stop accepting tasks, wait for busy instances under `policy`, then
    /// shut every instance down
    ///
    /// Returns `false` if shutdown was already requested. If the policy
    /// gives up before the pool is idle, shutdown is forced.
    #[instrument(skip_all, fields(pool = %self.inner.name))]
    pub async fn shutdown_with_retry(&self, policy: &RetryPolicy) -> bool {
        if !self.begin_draining() {
            return false;
        }

        let drained = retry(policy, PoolError::is_retryable, move |_| async move {
            match self.in_use() {
                0 => Ok(()),
                in_use => Err(PoolError::InstancesInUse(in_use)),
            }
        })
        .await;

        if let Err(e) = drained {
            warn!(pool = %self.inner.name, error = %e, "Graceful shutdown gave up; forcing shutdown");
        }

        self.terminate().await;
        true
    }

    /// Shut every instance down without waiting for in-flight tasks
    ///
    /// Running tasks are not cancelled. Returns `false` if shutdown was
    /// already requested.
    #[instrument(skip_all, fields(pool = %self.inner.name))]
    pub async fn shutdown_now(&self) -> bool {
        if !self.begin_draining() {
            return false;
        }

        self.terminate().await;
        true
    }

    /// Current lifecycle status
    pub fn status(&self) -> PoolStatus {
        self.inner.state.lock().status
    }

    /// Number of live instances
    pub fn size(&self) -> usize {
        self.inner.state.lock().instances.len()
    }

    /// Number of instances currently held by a task
    pub fn busy_count(&self) -> usize {
        self.inner.state.lock().busy_count()
    }

    /// Number of instance creations in flight
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().pending
    }

    pub fn max_instances(&self) -> usize {
        self.inner.max_instances
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// One pass of the acquisition algorithm
    async fn try_acquire(&self) -> Result<InstanceGuard<T>, PoolError> {
        let instance = match self.admit()? {
            Admission::Claimed(instance) => instance,
            Admission::Create(slot) => self.create_instance(slot, true).await?,
        };

        Ok(InstanceGuard { instance })
    }

    /// Decide, under the state lock, between reusing a free instance and
    /// reserving a creation slot
    fn admit(&self) -> Result<Admission<T>, PoolError> {
        let mut state = self.inner.state.lock();

        match state.status {
            PoolStatus::Ready => {}
            PoolStatus::Draining => return Err(PoolError::ShuttingDown),
            PoolStatus::Terminated => return Err(PoolError::Shutdown),
        }

        if let Some(instance) = state.instances.iter().find(|i| i.try_claim()) {
            return Ok(Admission::Claimed(Arc::clone(instance)));
        }

        if state.instances.len() + state.pending < self.inner.max_instances {
            state.pending += 1;
            return Ok(Admission::Create(CreationSlot::new(&self.inner)));
        }

        Err(PoolError::NoFreeInstance)
    }

    /// Resolve a reserved creation and register the new instance
    async fn create_instance(
        &self,
        slot: CreationSlot<T>,
        busy: bool,
    ) -> Result<Arc<PooledInstance<T>>, PoolError> {
        debug!(pool = %self.inner.name, "Creating instance");

        // On error the slot drops here and frees its reservation
        let value = self
            .inner
            .factory
            .create()
            .await
            .map_err(PoolError::Creation)?;

        match slot.register(value, busy) {
            Ok(instance) => {
                debug!(pool = %self.inner.name, instance_id = instance.id(), "Instance created");
                Ok(instance)
            }
            Err(orphan) => {
                debug!(pool = %self.inner.name, "Instance resolved after shutdown; discarding");
                if let Err(e) = orphan.shutdown().await {
                    warn!(pool = %self.inner.name, error = %e, "Failed to shut down discarded instance");
                }
                Err(PoolError::Shutdown)
            }
        }
    }

    /// Reserve the remaining capacity and create it in the background
    fn spawn_eager_creations(&self) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(
                    pool = %self.inner.name,
                    "No tokio runtime available; instances will be created on demand"
                );
                return;
            }
        };

        let slots: Vec<CreationSlot<T>> = {
            let mut state = self.inner.state.lock();
            let missing = self
                .inner
                .max_instances
                .saturating_sub(state.instances.len() + state.pending);
            state.pending += missing;
            (0..missing).map(|_| CreationSlot::new(&self.inner)).collect()
        };

        for slot in slots {
            let pool = self.clone();
            runtime.spawn(async move {
                if let Err(e) = pool.create_instance(slot, false).await {
                    warn!(pool = %pool.inner.name, error = %e, "Eager instance creation failed");
                }
            });
        }
    }

    /// Move from `Ready` to `Draining`; false if shutdown already began
    fn begin_draining(&self) -> bool {
        let mut state = self.inner.state.lock();
        let status = state.status;

        match status {
            PoolStatus::Ready => {
                state.status = PoolStatus::Draining;
                info!(
                    pool = %self.inner.name,
                    busy = state.busy_count(),
                    "Shutting down instance pool"
                );
                true
            }
            PoolStatus::Draining => {
                info!(pool = %self.inner.name, "Instance pool is already shutting down");
                false
            }
            PoolStatus::Terminated => {
                info!(pool = %self.inner.name, "Instance pool has already been shut down");
                false
            }
        }
    }

    /// Busy instances plus creations that will hand out an instance
    fn in_use(&self) -> usize {
        let state = self.inner.state.lock();
        state.busy_count() + state.pending
    }

    /// Shut down every live instance concurrently, then mark terminated
    async fn terminate(&self) {
        let instances = {
            let mut state = self.inner.state.lock();
            state.sealed = true;
            state.instances.clone()
        };

        let results = join_all(instances.iter().map(|instance| async move {
            (instance.id(), instance.value().shutdown().await)
        }))
        .await;

        for (instance_id, result) in results {
            if let Err(e) = result {
                warn!(pool = %self.inner.name, instance_id, error = %e, "Instance shutdown failed");
            }
        }

        self.inner.state.lock().status = PoolStatus::Terminated;
        info!(pool = %self.inner.name, instances = instances.len(), "Instance pool shut down");
    }
}

enum Admission<T> {
    Claimed(Arc<PooledInstance<T>>),
    Create(CreationSlot<T>),
}

/// A unit of reserved capacity for one in-flight creation
///
/// Dropping an unregistered slot gives the capacity back, which covers
/// factory errors and acquirers cancelled mid-creation.
struct CreationSlot<T> {
    inner: Arc<PoolInner<T>>,
    registered: bool,
}

impl<T> CreationSlot<T> {
    fn new(inner: &Arc<PoolInner<T>>) -> Self {
        Self {
            inner: Arc::clone(inner),
            registered: false,
        }
    }

    /// Turn the reservation into a live instance
    ///
    /// Hands the value back if forced shutdown has already sealed the pool.
    fn register(mut self, value: T, busy: bool) -> Result<Arc<PooledInstance<T>>, T> {
        let mut state = self.inner.state.lock();
        state.pending -= 1;
        self.registered = true;

        if state.sealed {
            return Err(value);
        }

        let instance = Arc::new(PooledInstance::new(state.next_id, value, busy));
        state.next_id += 1;
        state.instances.push(Arc::clone(&instance));
        Ok(instance)
    }
}

impl<T> Drop for CreationSlot<T> {
    fn drop(&mut self) {
        if !self.registered {
            self.inner.state.lock().pending -= 1;
        }
    }
}

/// Exclusive hold on a pooled instance
///
/// The instance goes back to the free set when the guard is dropped.
pub struct InstanceGuard<T> {
    instance: Arc<PooledInstance<T>>,
}

impl<T> InstanceGuard<T> {
    /// Shared handle to the instance value, for moving into a task
    pub fn instance(&self) -> Arc<T> {
        Arc::clone(self.instance.value())
    }

    pub fn id(&self) -> usize {
        self.instance.id()
    }
}

impl<T> Deref for InstanceGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.instance.value()
    }
}

impl<T> Drop for InstanceGuard<T> {
    fn drop(&mut self) {
        self.instance.release();
    }
}

impl<T> fmt::Debug for InstanceGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceGuard")
            .field("id", &self.instance.id())
            .finish()
    }
}
