//! Counted join barrier over spawned tasks.

use std::future::Future;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::trace;

/// Launches units of work as independent tasks and lets a caller wait until
/// every launched task has finished.
///
/// There are no return values and no error propagation: tasks that care about
/// their outcome record it themselves before returning.
#[derive(Debug, Clone)]
pub struct WorkerGroup {
    /// Tracks every spawned task.
    tracker: TaskTracker,
    /// Runtime the tasks are spawned on.
    handle: Handle,
}

impl WorkerGroup {
    /// Create a group that spawns onto the given runtime.
    pub fn new(handle: Handle) -> Self {
        Self {
            tracker: TaskTracker::new(),
            handle,
        }
    }

    /// Create a group bound to the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    #[doc(hidden)]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Launch `task` on the group's runtime.
    ///
    /// Safe to call from any thread, with or without an entered runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Detached: completion is observed through `wait`, not the handle.
        drop(self.tracker.spawn_on(task, &self.handle));
        trace!(active = self.tracker.len(), "worker spawned");
    }

    /// Number of tasks that have not finished yet.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    /// Returns `true` if no task is currently running.
    #[doc(hidden)]
    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait until every task has finished.
    ///
    /// Tasks spawned while waiting are waited for as well.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
