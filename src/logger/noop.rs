use super::Logger;
use std::fmt;

/// Discards every message, including fatal ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _args: fmt::Arguments<'_>) {}

    fn error(&self, _args: fmt::Arguments<'_>) {}

    fn fatal(&self, _args: fmt::Arguments<'_>) {}
}
