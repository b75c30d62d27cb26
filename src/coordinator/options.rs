//! Manager construction options.

use crate::logger::{Logger, StdLogger};
use crate::signals::SignalSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default limit for the whole teardown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings applied when a [`Manager`](super::Manager) is created.
///
/// ```
/// use std::time::Duration;
/// use graceful::{NoopLogger, Options};
///
/// let options = Options::new()
///     .with_logger(NoopLogger)
///     .with_shutdown_timeout(Duration::from_secs(10));
/// assert_eq!(options.shutdown_timeout(), Duration::from_secs(10));
/// ```
#[derive(Clone)]
pub struct Options {
    /// Cancelling this token starts the shutdown.
    pub(crate) token: CancellationToken,
    pub(crate) logger: Arc<dyn Logger>,
    /// Zero means wait without limit.
    pub(crate) shutdown_timeout: Duration,
    pub(crate) signals: SignalSet,
}

impl Options {
    /// Defaults: never-cancelled parent token, [`StdLogger`], 30 second
    /// timeout, platform signal set.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            logger: Arc::new(StdLogger::new()),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            signals: SignalSet::platform_default(),
        }
    }

    /// Parent lifecycle token; shutdown starts when it is cancelled.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Logger used by the coordinator.
    pub fn with_logger(self, logger: impl Logger + 'static) -> Self {
        self.with_shared_logger(Arc::new(logger))
    }

    /// Logger shared with other parts of the application.
    pub fn with_shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Limit for the whole teardown. `Duration::ZERO` disables the limit.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// OS signals to subscribe to.
    pub fn with_signals(mut self, signals: SignalSet) -> Self {
        self.signals = signals;
        self
    }

    /// Configured teardown limit.
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Configured signal set.
    pub fn signals(&self) -> &SignalSet {
        &self.signals
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("token_cancelled", &self.token.is_cancelled())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("signals", &self.signals)
            .finish_non_exhaustive()
    }
}
