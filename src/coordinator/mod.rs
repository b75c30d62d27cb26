//! Shutdown coordination: the [`Manager`], its options and failure records.

mod failure;
mod manager;
mod options;
mod registry;

pub use failure::{Failure, JobKind};
pub use manager::Manager;
pub use options::{DEFAULT_SHUTDOWN_TIMEOUT, Options};
