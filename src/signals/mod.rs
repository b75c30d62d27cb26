//! Termination triggers.
//!
//! [`SignalSet`] picks which OS signals are subscribed, [`SignalSource`]
//! receives them, and [`listen`] turns a received termination signal (or a
//! cancelled parent token) into a single call of the shutdown trigger.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT`, `SIGTERM`, `SIGQUIT` trigger shutdown
//! - `SIGHUP`, `SIGTSTP` are logged and otherwise ignored while subscribed
//! - a second termination signal once shutdown is under way exits the
//!   process immediately, so a hung teardown can still be interrupted
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

mod listener;
mod source;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use listener::listen;
pub use source::SignalSource;

/// An OS signal the coordinator can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// `SIGINT` (Ctrl-C in a terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGTSTP` (Ctrl-Z). Subscribing to it stops the terminal from
    /// suspending the process.
    Suspend,
}

impl Signal {
    /// Whether receiving this signal starts the shutdown.
    pub fn is_termination(self) -> bool {
        matches!(self, Signal::Interrupt | Signal::Terminate | Signal::Quit)
    }

    /// Conventional signal name, e.g. `SIGTERM`.
    pub fn name(self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::Suspend => "SIGTSTP",
        }
    }

    /// Process exit status used when this signal forces an exit, following
    /// the shell's `128 + signo` convention.
    pub fn exit_code(self) -> i32 {
        let signo = match self {
            Signal::Hangup => 1,
            Signal::Interrupt => 2,
            Signal::Quit => 3,
            Signal::Terminate => 15,
            Signal::Suspend => 20,
        };
        128 + signo
    }

    /// Whether the signal can be subscribed to on this platform.
    pub fn is_supported(self) -> bool {
        cfg!(unix) || self == Signal::Interrupt
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, duplicate-free set of signals to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SignalSet(Vec<Signal>);

impl SignalSet {
    /// Build a set, dropping duplicates but keeping first-seen order.
    pub fn new(signals: impl IntoIterator<Item = Signal>) -> Self {
        let mut set = Vec::new();
        for signal in signals {
            if !set.contains(&signal) {
                set.push(signal);
            }
        }
        Self(set)
    }

    /// A set with no signals; only the parent token or a direct call can
    /// then trigger shutdown.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Signals subscribed by default on this platform.
    pub fn platform_default() -> Self {
        if cfg!(unix) {
            Self(vec![Signal::Interrupt, Signal::Terminate, Signal::Suspend])
        } else {
            Self(vec![Signal::Interrupt])
        }
    }

    /// Iterate in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.0.iter().copied()
    }

    /// Whether `signal` is part of the set.
    pub fn contains(&self, signal: Signal) -> bool {
        self.0.contains(&signal)
    }

    /// Number of signals in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set has no signals.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signals listed more than once (possible after deserialization).
    pub fn duplicates(&self) -> Vec<Signal> {
        let mut seen = Vec::new();
        let mut duplicates = Vec::new();
        for signal in self.iter() {
            if seen.contains(&signal) {
                if !duplicates.contains(&signal) {
                    duplicates.push(signal);
                }
            } else {
                seen.push(signal);
            }
        }
        duplicates
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        Self::new(iter)
    }
}
