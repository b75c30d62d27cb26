//! Shutdown triggered by real OS signals.
//!
//! Each test sends a signal to the whole test process, so they run one at a
//! time and only on Unix. A listener stays subscribed after the shutdown
//! and exits the process on the next termination signal, so every test owns
//! its runtime and drops it, listener included, before releasing the lock.

#![cfg(unix)]

use graceful::{Manager, NoopLogger, Options, Signal, SignalSet};
use parking_lot::{Mutex, const_mutex};
use std::future::Future;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::timeout;

/// Serializes tests that signal the process.
static SIGNAL_LOCK: Mutex<()> = const_mutex(());

fn send_signal(name: &str) {
    let status = Command::new("kill")
        .arg(format!("-{name}"))
        .arg(std::process::id().to_string())
        .status()
        .expect("failed to run kill");
    assert!(status.success());
}

/// Run `test` on a fresh runtime that is shut down before the lock is
/// released.
fn serialized<Fut>(test: impl FnOnce() -> Fut)
where
    Fut: Future<Output = ()>,
{
    let _guard = SIGNAL_LOCK.lock();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(test());
    runtime.shutdown_timeout(Duration::from_secs(1));
}

async fn check_signal_triggers_shutdown(name: &str) {
    // Handlers are installed synchronously here, before any signal is sent.
    let manager = Manager::standalone(
        Options::new()
            .with_logger(NoopLogger)
            .with_signals(SignalSet::new([Signal::Interrupt, Signal::Terminate])),
    );
    let count = Arc::new(AtomicU32::new(0));

    let c = Arc::clone(&count);
    manager.add_shutdown_job(move || {
        let c = Arc::clone(&c);
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    send_signal(name);

    timeout(Duration::from_secs(5), manager.done())
        .await
        .expect("signal should trigger shutdown");
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(manager.errors().is_empty());
}

#[test]
fn test_sigint_triggers_shutdown() {
    serialized(|| check_signal_triggers_shutdown("INT"));
}

#[test]
fn test_sigterm_triggers_shutdown() {
    serialized(|| check_signal_triggers_shutdown("TERM"));
}

#[test]
fn test_hangup_is_logged_only() {
    serialized(|| async {
        let manager = Manager::standalone(
            Options::new()
                .with_logger(NoopLogger)
                .with_signals(SignalSet::new([Signal::Terminate, Signal::Hangup])),
        );

        send_signal("HUP");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!manager.is_shutting_down());
        assert!(!manager.shutdown_token().is_cancelled());

        manager.shutdown();
        timeout(Duration::from_secs(1), manager.done())
            .await
            .expect("teardown should finish");
    });
}
