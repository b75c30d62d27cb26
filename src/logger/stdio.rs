//! Built-in logger writing leveled lines to stdout and stderr.

use super::Logger;
use std::fmt;
use std::io::{self, Write};
use std::time::SystemTime;

/// Default logger.
///
/// `INFO:` lines go to stdout, `ERROR:` and `FATAL:` lines to stderr, each
/// prefixed with an RFC 3339 timestamp. [`Logger::fatal`] exits the process
/// with status 1 after writing.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl StdLogger {
    /// Create a new stdio logger.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for StdLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        let _ = io::stdout().lock().write_all(format_line("INFO", args).as_bytes());
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        let _ = io::stderr().lock().write_all(format_line("ERROR", args).as_bytes());
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        let _ = io::stderr().lock().write_all(format_line("FATAL", args).as_bytes());
        std::process::exit(1);
    }
}

/// Render one log line, newline included.
fn format_line(level: &str, args: fmt::Arguments<'_>) -> String {
    format!(
        "{}: {} {}\n",
        level,
        humantime::format_rfc3339_seconds(SystemTime::now()),
        args
    )
}
