//! The shutdown coordinator.
//!
//! ## Lifecycle
//! ```text
//! Manager::new ──► register OS signals ──► spawn signal listener
//!
//! add_running_job(job)   ──► spawned now, gets the shutdown token
//! add_shutdown_job(job)  ──► stored until shutdown
//!
//! trigger (signal | parent token | Manager::shutdown), first call only:
//!   ├─► cancel shutdown token        (running jobs see "time to stop")
//!   ├─► copy shutdown-job list
//!   ├─► spawn every copied job       (panics become failures)
//!   └─► watcher:
//!         ├─ timeout == 0 ─► wait for all jobs
//!         └─ timeout  > 0 ─► race all jobs vs. deadline
//!                              ├─ jobs first     ─► log success
//!                              └─ deadline first ─► log + Failure::Timeout
//!         └─► cancel finished token ─► done() resolves
//!
//! next termination signal while shutting down ─► process::exit(128 + signo)
//! ```
//!
//! ## Known limitations
//! - Cancellation is cooperative. A job that ignores its token is never
//!   aborted: after the deadline it keeps running in the background and, if
//!   the process is still alive when it ends, its outcome is still recorded.
//! - Shutdown jobs registered after the trigger fired are never run.
//! - While shutdown is under way a second termination signal exits the
//!   process at once with status `128 + signo`, skipping the teardown.
//!   Subscribed informational signals (`SIGTSTP`) stay intercepted for the
//!   life of the process.

use super::registry::{JobRegistry, ShutdownJob};
use super::{Failure, JobKind, Options};
use crate::logger::Logger;
use crate::signals::{self, SignalSource};
use crate::util::{FireOnce, WorkerGroup};
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

/// Process-wide instance behind [`Manager::new`] and [`Manager::get`].
static MANAGER: OnceLock<Manager> = OnceLock::new();

/// Coordinates the graceful shutdown of a process.
///
/// Cloning is cheap; every clone drives the same coordinator.
///
/// ```no_run
/// use graceful::{Manager, Options};
///
/// #[tokio::main]
/// async fn main() {
///     let manager = Manager::new(Options::default());
///
///     manager.add_running_job(|token| async move {
///         token.cancelled().await;
///         Ok(())
///     });
///     manager.add_shutdown_job(|| async { Ok(()) });
///
///     manager.done().await;
///     if !manager.errors().is_empty() {
///         std::process::exit(1);
///     }
/// }
/// ```
#[derive(Clone)]
pub struct Manager {
    inner: Arc<Inner>,
}

struct Inner {
    /// Cancelled when shutdown starts; handed to running jobs.
    shutdown: CancellationToken,
    /// Cancelled once the teardown has ended.
    finished: CancellationToken,
    shutdown_timeout: Duration,
    logger: Arc<dyn Logger>,
    workers: WorkerGroup,
    registry: JobRegistry,
    fired: FireOnce,
    handle: Handle,
}

impl Manager {
    /// Create the process-wide manager, or return it if it already exists.
    ///
    /// Only the first call applies `options` and starts listening for
    /// signals; later calls ignore their options.
    ///
    /// # Panics
    ///
    /// Panics when the first call happens outside of a Tokio runtime. Use
    /// [`Manager::try_new`] to get an error instead.
    pub fn new(options: Options) -> Self {
        MANAGER.get_or_init(|| Self::start(options)).clone()
    }

    /// Like [`Manager::new`], but returns an error instead of panicking when
    /// the manager does not exist yet and no Tokio runtime is running.
    pub fn try_new(options: Options) -> Result<Self, TryCurrentError> {
        if let Some(manager) = MANAGER.get() {
            return Ok(manager.clone());
        }
        Handle::try_current()?;
        Ok(Self::new(options))
    }

    /// [`Manager::new`] with `token` as the parent lifecycle token.
    pub fn with_token(token: CancellationToken, options: Options) -> Self {
        Self::new(options.with_token(token))
    }

    /// Return the process-wide manager.
    ///
    /// For code that cannot have the manager passed in.
    ///
    /// # Panics
    ///
    /// Panics if [`Manager::new`] has not been called yet.
    pub fn get() -> Self {
        match MANAGER.get() {
            Some(manager) => manager.clone(),
            None => panic!("manager is not initialized; call Manager::new first"),
        }
    }

    /// Return the process-wide manager if one exists.
    pub fn try_get() -> Option<Self> {
        MANAGER.get().cloned()
    }

    /// Create a manager that is not registered process-wide.
    ///
    /// Use this when the manager is passed explicitly through the
    /// application. It still listens for the signals in `options`.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    pub fn standalone(options: Options) -> Self {
        Self::start(options)
    }

    fn start(options: Options) -> Self {
        let Options {
            token: parent,
            logger,
            shutdown_timeout,
            signals: signal_set,
        } = options;
        let handle = Handle::current();

        let manager = Self {
            inner: Arc::new(Inner {
                shutdown: parent.child_token(),
                finished: CancellationToken::new(),
                shutdown_timeout,
                logger: Arc::clone(&logger),
                workers: WorkerGroup::new(handle.clone()),
                registry: JobRegistry::new(),
                fired: FireOnce::new(),
                handle: handle.clone(),
            }),
        };

        // Registered before spawning so no signal slips through in between.
        let source = match SignalSource::register(&signal_set) {
            Ok(source) => source,
            Err(e) => {
                logger.error(format_args!("failed to register signal handlers: {e}"));
                SignalSource::disabled()
            }
        };

        let weak = Arc::downgrade(&manager.inner);
        handle.spawn(signals::listen(
            source,
            parent,
            manager.inner.shutdown.clone(),
            logger,
            move || {
                if let Some(inner) = weak.upgrade() {
                    Manager { inner }.shutdown();
                }
            },
            |signal| std::process::exit(signal.exit_code()),
        ));

        debug!(
            timeout = ?shutdown_timeout,
            signals = signal_set.len(),
            "shutdown manager started"
        );
        manager
    }

    /// Spawn a long-running job.
    ///
    /// The job receives the shutdown token and should return soon after it
    /// is cancelled. A returned error or a panic is recorded as a
    /// [`Failure`]. Jobs added after shutdown started get an already
    /// cancelled token.
    ///
    /// Callable from any thread.
    pub fn add_running_job<F, Fut>(&self, job: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let token = self.inner.shutdown.clone();
        self.inner.workers.spawn(async move {
            inner
                .run_job(JobKind::Running, async move { job(token).await })
                .await;
        });
    }

    /// Register a cleanup job, run in parallel with the others once
    /// shutdown starts.
    ///
    /// Jobs registered after shutdown has started are **silently dropped**:
    /// the list is copied when the trigger fires and later additions are not
    /// part of the copy. Register cleanup early.
    pub fn add_shutdown_job<F, Fut>(&self, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let job: ShutdownJob = Arc::new(move || job().boxed());
        self.inner.registry.add_shutdown_job(job);
    }

    /// Start the shutdown.
    ///
    /// Only the first call across all triggers (signals, parent token,
    /// direct calls) does anything; the rest return immediately. Does not
    /// wait for the teardown, use [`Manager::done`] for that.
    pub fn shutdown(&self) {
        let inner = &self.inner;
        inner.fired.call_once(|| {
            inner.shutdown.cancel();

            let jobs = inner.registry.shutdown_jobs();
            debug!(jobs = jobs.len(), "starting shutdown jobs");
            for job in jobs {
                let worker = Arc::clone(inner);
                inner.workers.spawn(async move {
                    worker
                        .run_job(JobKind::Shutdown, async move { job().await })
                        .await;
                });
            }

            let watcher = Arc::clone(inner);
            inner.handle.spawn(async move {
                watcher.await_teardown().await;
                watcher.finished.cancel();
            });
        });
    }

    /// Resolves once the teardown has ended, either because every job
    /// finished or because the timeout expired.
    pub fn done(&self) -> WaitForCancellationFutureOwned {
        self.inner.finished.clone().cancelled_owned()
    }

    /// Returns `true` once [`Manager::done`] has resolved.
    pub fn is_done(&self) -> bool {
        self.inner.finished.is_cancelled()
    }

    /// Returns `true` once the shutdown has been triggered.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.fired.has_fired()
    }

    /// The token handed to running jobs. Cancelled when shutdown starts (or
    /// when the parent token is cancelled).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Copy of every failure recorded so far, in the order recorded.
    pub fn errors(&self) -> Vec<Failure> {
        self.inner.registry.failures()
    }

    /// Configured teardown limit.
    pub fn shutdown_timeout(&self) -> Duration {
        self.inner.shutdown_timeout
    }

    /// Number of running and shutdown jobs that have not finished yet.
    pub fn active_jobs(&self) -> usize {
        self.inner.workers.len()
    }
}

impl Inner {
    /// Drive one job to completion, recording an error or a panic.
    async fn run_job<Fut>(&self, kind: JobKind, job: Fut)
    where
        Fut: Future<Output = anyhow::Result<()>>,
    {
        match AssertUnwindSafe(job).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => self.registry.record(Failure::job(kind, error)),
            Err(payload) => {
                let failure = Failure::from_panic(kind, payload.as_ref());
                self.logger.error(format_args!("{failure}"));
                self.registry.record(failure);
            }
        }
    }

    /// Wait for every job, bounded by the timeout when one is set.
    async fn await_teardown(&self) {
        if self.shutdown_timeout.is_zero() {
            self.workers.wait().await;
            return;
        }

        tokio::select! {
            _ = self.workers.wait() => {
                self.logger.info(format_args!("All jobs completed successfully"));
            }
            _ = tokio::time::sleep(self.shutdown_timeout) => {
                self.logger.error(format_args!(
                    "Shutdown timeout ({}) exceeded, some jobs may not have completed",
                    humantime::format_duration(self.shutdown_timeout)
                ));
                self.registry.record(Failure::Timeout {
                    timeout: self.shutdown_timeout,
                });
            }
        }
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("shutdown_timeout", &self.inner.shutdown_timeout)
            .field("shutting_down", &self.is_shutting_down())
            .field("done", &self.is_done())
            .field("active_jobs", &self.inner.workers.len())
            .field("shutdown_jobs", &self.inner.registry.shutdown_job_count())
            .field("failures", &self.inner.registry.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;
    use crate::signals::SignalSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;
    use tokio::time::timeout;

    fn options() -> Options {
        Options::new()
            .with_logger(NoopLogger)
            .with_signals(SignalSet::empty())
    }

    #[tokio::test]
    async fn test_running_job_stops_on_shutdown() {
        let manager = Manager::standalone(options());
        let count = Arc::new(AtomicU32::new(0));

        let ticks = Arc::clone(&count);
        manager.add_running_job(|token| async move {
            loop {
                ticks.fetch_add(1, Ordering::SeqCst);
                tokio::select! {
                    _ = token.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.shutdown();
        timeout(Duration::from_secs(1), manager.done()).await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(manager.errors().is_empty());
    }

    #[tokio::test]
    async fn test_done_pending_until_shutdown() {
        let manager = Manager::standalone(options());
        let mut done = tokio_test::task::spawn(manager.done());

        tokio_test::assert_pending!(done.poll());
        assert!(!manager.is_shutting_down());

        manager.shutdown();
        timeout(Duration::from_secs(1), manager.done()).await.unwrap();
        assert!(done.is_woken());
        tokio_test::assert_ready!(done.poll());
        assert!(manager.is_done());
        assert!(manager.is_shutting_down());
    }

    #[tokio::test]
    async fn test_shutdown_token_cancelled_before_shutdown_jobs() {
        let manager = Manager::standalone(options());
        let token = manager.shutdown_token();
        let observed = Arc::new(AtomicU32::new(0));

        let seen = Arc::clone(&observed);
        manager.add_shutdown_job(move || {
            let token = token.clone();
            let seen = Arc::clone(&seen);
            async move {
                if token.is_cancelled() {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
        });

        manager.shutdown();
        manager.done().await;
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_job_added_after_shutdown_gets_cancelled_token() {
        let manager = Manager::standalone(options());
        manager.shutdown();

        let (tx, rx) = tokio::sync::oneshot::channel();
        manager.add_running_job(|token| async move {
            let _ = tx.send(token.is_cancelled());
            Ok(())
        });

        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_job_added_late_is_dropped() {
        let manager = Manager::standalone(options());
        let count = Arc::new(AtomicU32::new(0));

        manager.shutdown();
        let late = Arc::clone(&count);
        manager.add_shutdown_job(move || {
            let late = Arc::clone(&late);
            async move {
                late.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        manager.done().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_parent_token_cancels_shutdown_token() {
        let parent = CancellationToken::new();
        let manager = Manager::standalone(options().with_token(parent.clone()));

        parent.cancel();
        assert!(manager.shutdown_token().is_cancelled());
        timeout(Duration::from_secs(1), manager.done()).await.unwrap();
        assert!(manager.is_shutting_down());
    }

    #[tokio::test]
    async fn test_errors_and_panics_are_recorded() {
        let manager = Manager::standalone(options());

        manager.add_running_job(|_| async { Err(anyhow::anyhow!("first error")) });
        manager.add_shutdown_job(|| async { Err(anyhow::anyhow!("second error")) });
        manager.add_shutdown_job(|| async {
            let values: Vec<u32> = Vec::new();
            let index = values.len() + 3;
            std::hint::black_box(values[index]);
            Ok(())
        });

        manager.shutdown();
        manager.done().await;

        let errors = manager.errors();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.to_string() == "running job failed: first error"));
        assert!(errors.iter().any(|e| e.to_string() == "shutdown job failed: second error"));
        let panic = errors
            .iter()
            .find(|e| matches!(e, Failure::Panic { .. }))
            .expect("panic should be recorded");
        assert_eq!(panic.kind(), Some(JobKind::Shutdown));
        assert!(panic.to_string().contains("index out of bounds"));
    }

    #[tokio::test]
    #[allow(unreachable_code)]
    async fn test_panic_in_closure_body_is_recorded() {
        let manager = Manager::standalone(options());

        manager.add_running_job(|_| {
            panic!("before the future");
            async { Ok(()) }
        });

        manager.shutdown();
        manager.done().await;

        let errors = manager.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "panic in running job: before the future");
    }

    #[tokio::test]
    async fn test_timeout_records_failure() {
        let manager =
            Manager::standalone(options().with_shutdown_timeout(Duration::from_millis(100)));

        manager.add_running_job(|_| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        });

        let started = Instant::now();
        manager.shutdown();
        timeout(Duration::from_secs(2), manager.done()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(2));
        let errors = manager.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            Failure::Timeout { timeout } if timeout == Duration::from_millis(100)
        ));
        assert_eq!(manager.active_jobs(), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_for_slow_job() {
        let manager = Manager::standalone(options().with_shutdown_timeout(Duration::ZERO));
        let finished = Arc::new(AtomicU32::new(0));

        let flag = Arc::clone(&finished);
        manager.add_running_job(|token| async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(150)).await;
            flag.store(1, Ordering::SeqCst);
            Ok(())
        });

        manager.shutdown();
        manager.done().await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert!(manager.errors().iter().all(|e| !e.is_timeout()));
    }

    #[tokio::test]
    async fn test_debug_output() {
        let manager = Manager::standalone(options());
        manager.add_shutdown_job(|| async { Ok(()) });

        let debug = format!("{manager:?}");
        assert!(debug.contains("shutdown_jobs: 1"));
        assert!(debug.contains("shutting_down: false"));
    }
}
