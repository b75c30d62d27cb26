//! Run-exactly-once guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Guards a critical section so it executes at most once, no matter how many
/// callers race for it.
///
/// Unlike a lock, the guard never re-opens: once fired, every later call is a
/// no-op that returns immediately without waiting for the first caller to
/// finish its section.
#[derive(Debug, Default)]
pub struct FireOnce {
    fired: AtomicBool,
}

impl FireOnce {
    /// Create an unfired guard.
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Run `f` if this is the first call. Returns whether `f` ran.
    pub fn call_once<F: FnOnce()>(&self, f: F) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        f();
        true
    }

    /// Returns `true` once any caller has claimed the guard.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
