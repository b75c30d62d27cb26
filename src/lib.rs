//! graceful - Graceful shutdown coordination for Tokio services
//!
//! This crate provides a shutdown [`Manager`] that:
//! - Runs long-lived jobs and hands them a cancellation token
//! - Starts the shutdown on SIGINT/SIGTERM, on a cancelled parent token, or
//!   on a direct call, exactly once
//! - Runs cleanup jobs in parallel once running jobs are told to stop
//! - Bounds the whole teardown with an optional timeout
//! - Collects every returned error and recovered panic for inspection
//!
//! The manager spawns its jobs and its signal listener on the Tokio runtime
//! it is created in, so [`Manager::new`] must be called from inside one
//! (it panics otherwise, like `tokio::spawn`). [`Manager::try_new`] reports
//! a missing runtime as an error instead.
//!
//! ```no_run
//! use std::time::Duration;
//! use graceful::{Manager, Options};
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = Manager::new(Options::new().with_shutdown_timeout(Duration::from_secs(10)));
//!
//!     manager.add_running_job(|token| async move {
//!         while !token.is_cancelled() {
//!             tokio::time::sleep(Duration::from_millis(100)).await;
//!         }
//!         Ok(())
//!     });
//!
//!     manager.add_shutdown_job(|| async {
//!         // flush buffers, close connections...
//!         Ok(())
//!     });
//!
//!     manager.done().await;
//!     for failure in manager.errors() {
//!         eprintln!("{failure}");
//!     }
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod logger;
pub mod signals;
pub mod util;

pub use config::Config;
pub use coordinator::{DEFAULT_SHUTDOWN_TIMEOUT, Failure, JobKind, Manager, Options};
pub use logger::{Logger, NoopLogger, StdLogger, TracingLogger};
pub use signals::{Signal, SignalSet};
