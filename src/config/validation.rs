//! Configuration validation.

use crate::config::Config;

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - Signals listed at most once
/// - Signals supported on this platform
/// - At least one termination signal when any signal is listed
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing every problem found.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    let signals = &config.shutdown.signals;

    for signal in signals.duplicates() {
        errors.push(format!("duplicate signal: {}", signal));
    }

    for signal in signals.iter().filter(|s| !s.is_supported()) {
        errors.push(format!("signal {} is not supported on this platform", signal));
    }

    // An empty set is fine (token-only shutdown); a set of informational
    // signals alone never triggers anything.
    if !signals.is_empty() && !signals.iter().any(|s| s.is_termination()) {
        errors.push(format!(
            "signals [{}] contain no termination signal (interrupt, terminate or quit)",
            signals.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
