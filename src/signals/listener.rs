//! Background task forwarding termination causes to the shutdown trigger.

use super::{Signal, SignalSource};
use crate::logger::Logger;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Listen for termination causes and call `trigger` once one arrives.
///
/// A termination signal or a cancelled `parent` calls `trigger`. Once
/// shutdown is under way (through this listener or because `shutdown` was
/// cancelled elsewhere) the next termination signal calls `force_exit`
/// instead, and the listener stops. Non-termination signals are logged and
/// listening continues. If the source is exhausted only the tokens are
/// watched from then on.
pub async fn listen<F, E>(
    mut source: SignalSource,
    parent: CancellationToken,
    shutdown: CancellationToken,
    logger: Arc<dyn Logger>,
    trigger: F,
    force_exit: E,
) where
    F: Fn(),
    E: Fn(Signal),
{
    let pid = std::process::id();
    let mut draining = false;
    debug!(pid, "signal listener starting");

    loop {
        tokio::select! {
            // Parent before shutdown: a cancelled parent also cancels the
            // child shutdown token, and the trigger must still run.
            biased;

            _ = parent.cancelled(), if !draining => {
                logger.info(format_args!(
                    "PID {pid}. Parent token for manager cancelled. Shutting down..."
                ));
                trigger();
                draining = true;
            }

            _ = shutdown.cancelled(), if !draining => {
                debug!(pid, "shutdown started elsewhere, next termination signal exits");
                draining = true;
            }

            received = source.recv() => match received {
                Some(signal) if signal.is_termination() && draining => {
                    logger.error(format_args!(
                        "PID {pid}. Received {signal} during shutdown. Exiting..."
                    ));
                    force_exit(signal);
                    break;
                }
                Some(signal) if signal.is_termination() => {
                    logger.info(format_args!("PID {pid}. Received {signal}. Shutting down..."));
                    trigger();
                    draining = true;
                }
                Some(signal) => {
                    logger.info(format_args!("PID {pid}. Received {signal}."));
                }
                None if draining => break,
                None => {
                    debug!("signal source exhausted, watching tokens only");
                    source = SignalSource::disabled();
                }
            },
        }
    }

    debug!(pid, "signal listener stopped");
}
