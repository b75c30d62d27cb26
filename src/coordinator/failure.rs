//! Failure records collected during a run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Which registry a job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Long-lived job that watches the shutdown token.
    Running,
    /// Cleanup job run once after the shutdown token is cancelled.
    Shutdown,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Running => f.write_str("running"),
            JobKind::Shutdown => f.write_str("shutdown"),
        }
    }
}

/// # A failure observed by the coordinator.
///
/// Returned errors, recovered panics and the deadline all land in the same
/// ordered list; no variant outranks another.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum Failure {
    /// A job returned `Err`.
    #[error("{kind} job failed: {error:#}")]
    Job {
        /// Registry the job came from.
        kind: JobKind,
        /// The error the job returned.
        error: Arc<anyhow::Error>,
    },

    /// A job panicked; the payload is rendered as text.
    #[error("panic in {kind} job: {message}")]
    Panic {
        /// Registry the job came from.
        kind: JobKind,
        /// Panic payload message.
        message: String,
    },

    /// The teardown did not finish within the configured timeout.
    #[error("shutdown timeout exceeded: {}", humantime::format_duration(*timeout))]
    Timeout {
        /// The configured timeout.
        timeout: Duration,
    },
}

impl Failure {
    /// Wrap an error returned by a job.
    pub fn job(kind: JobKind, error: anyhow::Error) -> Self {
        Failure::Job {
            kind,
            error: Arc::new(error),
        }
    }

    /// Describe a recovered panic payload.
    pub fn from_panic(kind: JobKind, payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Failure::Panic { kind, message }
    }

    /// Job registry this failure came from; `None` for the timeout.
    pub fn kind(&self) -> Option<JobKind> {
        match self {
            Failure::Job { kind, .. } | Failure::Panic { kind, .. } => Some(*kind),
            Failure::Timeout { .. } => None,
        }
    }

    /// Returns `true` for [`Failure::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Failure::Timeout { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Failure::Job { .. } => "job_failed",
            Failure::Panic { .. } => "job_panicked",
            Failure::Timeout { .. } => "shutdown_timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_failure_display() {
        let err = anyhow::anyhow!("connection reset").context("flush queue");
        let failure = Failure::job(JobKind::Shutdown, err);

        assert_eq!(
            failure.to_string(),
            "shutdown job failed: flush queue: connection reset"
        );
        assert_eq!(failure.kind(), Some(JobKind::Shutdown));
        assert_eq!(failure.as_label(), "job_failed");
    }

    #[test]
    fn test_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let failure = Failure::from_panic(JobKind::Running, payload.as_ref());
        assert_eq!(failure.to_string(), "panic in running job: boom");

        let payload: Box<dyn Any + Send> = Box::new(format!("index {} out of range", 7));
        let failure = Failure::from_panic(JobKind::Shutdown, payload.as_ref());
        assert_eq!(failure.to_string(), "panic in shutdown job: index 7 out of range");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        let failure = Failure::from_panic(JobKind::Running, payload.as_ref());
        assert_eq!(failure.to_string(), "panic in running job: unknown panic");
    }

    #[test]
    fn test_timeout_display() {
        let failure = Failure::Timeout {
            timeout: Duration::from_millis(1500),
        };
        assert!(failure.is_timeout());
        assert_eq!(failure.kind(), None);
        assert_eq!(failure.to_string(), "shutdown timeout exceeded: 1s 500ms");
    }
}
