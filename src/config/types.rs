//! Configuration data types.

use crate::coordinator::{DEFAULT_SHUTDOWN_TIMEOUT, Options};
use crate::logger;
use crate::signals::SignalSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Shutdown coordinator settings
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Which logger the coordinator writes through.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggerKind {
    /// Leveled lines on stdout/stderr.
    #[default]
    Std,
    /// Forward to `tracing`, formatted per `global.log_format`.
    Tracing,
    /// Discard everything.
    Noop,
}

/// Shutdown coordinator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShutdownConfig {
    /// Limit for the whole teardown; "0s" waits without limit
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Logger used by the coordinator
    #[serde(default)]
    pub logger: LoggerKind,

    /// OS signals to subscribe to (platform default when omitted)
    #[serde(default)]
    pub signals: SignalSet,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout: default_shutdown_timeout(),
            logger: LoggerKind::default(),
            signals: SignalSet::default(),
        }
    }
}

impl ShutdownConfig {
    /// Build manager options from these settings.
    pub fn to_options(&self) -> Options {
        Options::new()
            .with_shared_logger(logger::from_kind(&self.logger))
            .with_shutdown_timeout(self.timeout)
            .with_signals(SignalSet::new(self.signals.iter()))
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_timeout() -> Duration {
    DEFAULT_SHUTDOWN_TIMEOUT
}

/// Custom serde module for humantime durations.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
