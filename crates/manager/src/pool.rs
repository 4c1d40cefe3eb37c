//! Bounded background task pool.
//!
//! Cache maintenance (writes, cleanup sweeps, stat queries) runs off the
//! caller's path on the shared runtime, but never with more than
//! [`DEFAULT_WORKERS`] cache tasks in flight at once. The bound is a
//! semaphore rather than dedicated threads: tasks queue on permit
//! acquisition and the runtime schedules them wherever it likes.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// How many cache tasks may run concurrently by default.
pub const DEFAULT_WORKERS: usize = 4;

/// A bounded pool of background cache tasks.
///
/// Cheap to clone; clones share the same permit pool.
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl TaskPool {
    /// Create a pool allowing at most `workers` tasks in flight.
    pub fn new(workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Spawn a future onto the pool, returning a handle to its result.
    ///
    /// The future starts once a permit is free; until then it waits in FIFO
    /// order behind the tasks already submitted.
    pub fn spawn<F>(&self, future: F) -> TaskHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let inner = tokio::spawn(async move {
            // unwrap is safe: the semaphore is never closed
            let _permit = permits.acquire_owned().await.unwrap();
            future.await
        });
        TaskHandle { inner }
    }

    /// Permits currently free, i.e. how many tasks could start immediately.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Handle to a task submitted to a [`TaskPool`].
///
/// Dropping the handle detaches the task; it keeps running to completion in
/// the background. Awaiting [`join`](Self::join) retrieves the result.
#[derive(Debug)]
pub struct TaskHandle<T> {
    inner: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    /// Wait for the task and take its result.
    ///
    /// Returns `None` if the task panicked or was aborted.
    pub async fn join(self) -> Option<T> {
        self.inner.await.ok()
    }

    /// Whether the task has already finished.
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Let the task run to completion without observing its result.
    pub fn detach(self) {}

    /// Cancel the task if it has not completed yet.
    pub fn abort(&self) {
        self.inner.abort();
    }
}
