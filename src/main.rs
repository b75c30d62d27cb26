//! graceful - demo of the shutdown coordinator
//!
//! Usage:
//!     graceful [--config <path>] [--trigger-after 2s] [--stuck]
//!
//! Starts a few worker jobs and cleanup jobs, then waits for Ctrl+C (or the
//! self-trigger) and reports every failure. Exits with status 1 if any job
//! failed or the shutdown timed out.
//!
//! See --help for more options.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use graceful::Manager;
use graceful::config::{Config, load_config};
use graceful::util::init_logging;

/// Demo of graceful shutdown with running and cleanup jobs.
#[derive(Parser, Debug)]
#[command(name = "graceful")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Override the shutdown timeout, e.g. "3s" ("0s" waits forever)
    #[arg(short, long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Number of worker jobs that stop promptly when asked
    #[arg(short, long, default_value_t = 2)]
    workers: usize,

    /// Add a job that keeps running for 5s after shutdown starts
    #[arg(long)]
    stuck: bool,

    /// Add a cleanup job that fails
    #[arg(long)]
    fail_cleanup: bool,

    /// Trigger shutdown after this delay instead of waiting for a signal
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    trigger_after: Option<Duration>,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| {
            format!("failed to load configuration from '{}'", path.display())
        })?,
        None => Config::default(),
    };

    if let Some(timeout) = cli.timeout {
        config.shutdown.timeout = timeout;
    }

    // CLI overrides config
    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.global.log_level);

    init_logging(log_level, &config.global.log_format);

    if cli.validate {
        info!("Configuration is valid");
        println!("Configuration is valid.");
        println!(
            "  Shutdown timeout: {}",
            humantime::format_duration(config.shutdown.timeout)
        );
        println!("  Logger: {:?}", config.shutdown.logger);
        for signal in config.shutdown.signals.iter() {
            println!(
                "    - {} ({})",
                signal,
                if signal.is_termination() { "shutdown" } else { "log only" }
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        timeout = %humantime::format_duration(config.shutdown.timeout),
        workers = cli.workers,
        stuck = cli.stuck,
        "graceful demo starting"
    );

    run(cli, config)
}

/// Run the demo with the given configuration.
fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(async { run_async(cli, config).await })
}

/// Async entry point for the demo.
async fn run_async(cli: Cli, config: Config) -> Result<ExitCode> {
    let manager = Manager::new(config.shutdown.to_options());

    for id in 0..cli.workers {
        manager.add_running_job(move |token| worker(id, token));
    }

    if cli.stuck {
        manager.add_running_job(|token| async move {
            token.cancelled().await;
            warn!("stuck job: shutdown requested, still busy for 5s");
            tokio::time::sleep(Duration::from_secs(5)).await;
            info!("stuck job: done");
            Ok(())
        });
    }

    manager.add_shutdown_job(|| async {
        info!("closing connections");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    });

    manager.add_shutdown_job(|| async {
        info!("flushing buffers");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    });

    if cli.fail_cleanup {
        manager.add_shutdown_job(|| async {
            anyhow::bail!("release lock: resource busy");
        });
    }

    if let Some(delay) = cli.trigger_after {
        let trigger = manager.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(after = %humantime::format_duration(delay), "triggering shutdown");
            trigger.shutdown();
        });
    }

    info!("running");
    info!("press Ctrl+C to stop");

    manager.done().await;

    let failures = manager.errors();
    if failures.is_empty() {
        info!("shutdown complete");
        return Ok(ExitCode::SUCCESS);
    }

    for failure in &failures {
        error!(kind = failure.as_label(), "{}", failure);
    }
    error!(count = failures.len(), "shutdown finished with failures");
    Ok(ExitCode::FAILURE)
}

/// A job that ticks until asked to stop.
async fn worker(id: usize, token: CancellationToken) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                ticks += 1;
                info!(worker = id, ticks, "working");
            }

            _ = token.cancelled() => {
                info!(worker = id, ticks, "worker stopping");
                return Ok(());
            }
        }
    }
}
