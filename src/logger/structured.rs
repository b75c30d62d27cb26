//! Logger that forwards to `tracing`.

use super::Logger;
use std::fmt;
use tracing::{error, info};

/// Delegates to the `tracing` macros under the `graceful` target.
///
/// Encoding (text or JSON) is decided by the installed subscriber, usually
/// set up with [`crate::util::init_logging`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing-backed logger.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        info!(target: "graceful", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        error!(target: "graceful", "{}", args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        error!(target: "graceful", fatal = true, "{}", args);
        std::process::exit(1);
    }
}
