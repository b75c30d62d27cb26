//! Shared mutable state of the coordinator.

use super::Failure;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;

/// A registered shutdown job. Stored behind `Arc` so the registry can be
/// copied before fan-out without consuming it.
pub(crate) type ShutdownJob = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Default)]
struct Registry {
    failures: Vec<Failure>,
    shutdown_jobs: Vec<ShutdownJob>,
}

/// Failure list and shutdown-job list behind one read/write lock.
///
/// Writers (appending a failure, registering a job) take the write side;
/// snapshots take the read side and hand out independent copies.
#[derive(Default)]
pub(crate) struct JobRegistry {
    inner: RwLock<Registry>,
}

impl JobRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a failure.
    pub(crate) fn record(&self, failure: Failure) {
        self.inner.write().failures.push(failure);
    }

    /// Copy of every failure, in append order.
    pub(crate) fn failures(&self) -> Vec<Failure> {
        self.inner.read().failures.clone()
    }

    pub(crate) fn failure_count(&self) -> usize {
        self.inner.read().failures.len()
    }

    pub(crate) fn add_shutdown_job(&self, job: ShutdownJob) {
        self.inner.write().shutdown_jobs.push(job);
    }

    /// Copy of the shutdown-job list. Jobs registered afterwards are not in it.
    pub(crate) fn shutdown_jobs(&self) -> Vec<ShutdownJob> {
        self.inner.read().shutdown_jobs.clone()
    }

    pub(crate) fn shutdown_job_count(&self) -> usize {
        self.inner.read().shutdown_jobs.len()
    }
}
