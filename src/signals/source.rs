//! Receiving subscribed signals.

use super::{Signal, SignalSet};
use std::io;
use tokio::sync::mpsc;

/// Stream of received signals.
///
/// OS handlers are installed when the source is built, not when it is first
/// polled, so a signal delivered right after [`SignalSource::register`]
/// returns is never lost to the default disposition.
pub struct SignalSource {
    inner: Inner,
}

enum Inner {
    #[cfg(unix)]
    Unix(Vec<(Signal, tokio::signal::unix::Signal)>),
    #[cfg(not(unix))]
    CtrlC,
    Channel(mpsc::UnboundedReceiver<Signal>),
    Disabled,
}

impl SignalSource {
    /// Install OS handlers for every signal in `set`.
    ///
    /// Must be called from within a Tokio runtime.
    #[cfg(unix)]
    pub fn register(set: &SignalSet) -> io::Result<Self> {
        use tokio::signal::unix::signal;

        let streams = set
            .iter()
            .map(|s| signal(unix_kind(s)).map(|stream| (s, stream)))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            inner: Inner::Unix(streams),
        })
    }

    /// Install OS handlers for every signal in `set`.
    ///
    /// Only [`Signal::Interrupt`] (Ctrl-C) is available here; other signals
    /// are rejected.
    #[cfg(not(unix))]
    pub fn register(set: &SignalSet) -> io::Result<Self> {
        if let Some(signal) = set.iter().find(|s| !s.is_supported()) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("{signal} is not supported on this platform"),
            ));
        }
        if set.contains(Signal::Interrupt) {
            Ok(Self { inner: Inner::CtrlC })
        } else {
            Ok(Self::disabled())
        }
    }

    /// A source that never yields.
    pub fn disabled() -> Self {
        Self {
            inner: Inner::Disabled,
        }
    }

    /// A source fed from a channel instead of the OS.
    ///
    /// Useful for embedding the coordinator under another signal handler.
    pub fn from_channel(rx: mpsc::UnboundedReceiver<Signal>) -> Self {
        Self {
            inner: Inner::Channel(rx),
        }
    }

    /// Wait for the next signal. `None` means the source is exhausted.
    pub async fn recv(&mut self) -> Option<Signal> {
        match &mut self.inner {
            #[cfg(unix)]
            Inner::Unix(streams) => {
                if streams.is_empty() {
                    return std::future::pending().await;
                }
                let pending = streams.iter_mut().map(|(signal, stream)| {
                    let signal = *signal;
                    Box::pin(async move { stream.recv().await.map(|()| signal) })
                });
                let (received, _, _) = futures::future::select_all(pending).await;
                received
            }
            #[cfg(not(unix))]
            Inner::CtrlC => tokio::signal::ctrl_c().await.ok().map(|()| Signal::Interrupt),
            Inner::Channel(rx) => rx.recv().await,
            Inner::Disabled => std::future::pending().await,
        }
    }
}

#[cfg(unix)]
fn unix_kind(signal: Signal) -> tokio::signal::unix::SignalKind {
    use tokio::signal::unix::SignalKind;

    // tokio has no named constructor for SIGTSTP.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    const SIGTSTP: i32 = 20;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const SIGTSTP: i32 = 18;

    match signal {
        Signal::Interrupt => SignalKind::interrupt(),
        Signal::Terminate => SignalKind::terminate(),
        Signal::Quit => SignalKind::quit(),
        Signal::Hangup => SignalKind::hangup(),
        Signal::Suspend => SignalKind::from_raw(SIGTSTP),
    }
}
