//! Logging capability consumed by the shutdown coordinator.
//!
//! The coordinator never talks to a logging backend directly. It calls a
//! [`Logger`], which can be:
//! - [`StdLogger`]: leveled lines on stdout/stderr (the default)
//! - [`TracingLogger`]: forwards to `tracing`, text or JSON depending on the
//!   installed subscriber (see [`crate::util::init_logging`])
//! - [`NoopLogger`]: discards everything

mod noop;
mod stdio;
mod structured;

use crate::config::LoggerKind;
use std::fmt;
use std::sync::Arc;

pub use noop::NoopLogger;
pub use stdio::StdLogger;
pub use structured::TracingLogger;

/// Leveled logging used by the coordinator.
///
/// Every method takes pre-formatted arguments: build them with
/// `format_args!("...", ..)`, or `format_args!("{msg}")` for a plain message.
///
/// The coordinator calls these synchronously, sometimes from inside its own
/// bookkeeping. Implementations must not block indefinitely and must not call
/// back into the [`Manager`](crate::Manager).
///
/// There is no warning level: an exceeded shutdown timeout is reported
/// through [`Logger::error`].
pub trait Logger: Send + Sync {
    /// Informational message.
    fn info(&self, args: fmt::Arguments<'_>);

    /// Error message.
    fn error(&self, args: fmt::Arguments<'_>);

    /// Unrecoverable error. Implementations may terminate the process.
    fn fatal(&self, args: fmt::Arguments<'_>);
}

/// Build the logger selected in configuration.
pub fn from_kind(kind: &LoggerKind) -> Arc<dyn Logger> {
    match kind {
        LoggerKind::Std => Arc::new(StdLogger::new()),
        LoggerKind::Tracing => Arc::new(TracingLogger::new()),
        LoggerKind::Noop => Arc::new(NoopLogger),
    }
}
