//! Utility functions and helpers.

mod fire_once;
mod logging;
mod worker_group;

pub use fire_once::FireOnce;
pub use logging::init_logging;
pub use worker_group::WorkerGroup;
