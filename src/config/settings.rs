//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SupervisorError;
use crate::supervisor::{CommandTemplate, KillPolicy};
use crate::{Error, Result};

/// Quiet period used when none is configured or the configured one is unusable.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Subdirectory depth watched below each root.
pub const DEFAULT_DEPTH: usize = 1;

/// Main configuration for fswatch.
#[derive(Debug, Clone)]
pub struct Config {
    /// Command to run: executable followed by its arguments.
    pub command: Vec<String>,

    /// Root directories to watch.
    pub watch_dirs: Vec<PathBuf>,

    /// Maximum subdirectory depth below each root (0 = root only).
    pub depth: usize,

    /// Quiet period before a burst of changes triggers a restart.
    pub delay: Duration,

    /// How a superseded child is stopped.
    pub kill_policy: KillPolicy,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            watch_dirs: vec![PathBuf::from(".")],
            depth: DEFAULT_DEPTH,
            delay: DEFAULT_DELAY,
            kill_policy: KillPolicy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.command.first().map_or(true, String::is_empty) {
            return Err(SupervisorError::EmptyCommand.into());
        }

        if self.watch_dirs.is_empty() {
            return Err(Error::config("at least one watch directory is required"));
        }

        Ok(())
    }

    /// Resolve the executable on the search path and build the launch template.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no command or the executable cannot be found.
    pub fn command_template(&self) -> Result<CommandTemplate> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(SupervisorError::EmptyCommand)?;

        let resolved = which::which(program).map_err(|e| SupervisorError::CommandNotFound {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(program = %program, resolved = %resolved.display(), "Resolved command");

        Ok(CommandTemplate::new(resolved, args.to_vec()))
    }
}

/// Parse a debounce delay.
///
/// Accepts human-readable durations (`500ms`, `2s`, `1m 30s`) and bare decimal
/// seconds (`0.5`). Anything else falls back to [`DEFAULT_DELAY`] with a warning.
#[must_use]
pub fn parse_delay(raw: &str) -> Duration {
    let raw = raw.trim();

    if let Ok(delay) = humantime::parse_duration(raw) {
        return delay;
    }

    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Duration::from_secs_f64(secs),
        _ => {
            tracing::warn!(
                delay = %raw,
                fallback = ?DEFAULT_DELAY,
                "Unparsable delay, using default"
            );
            DEFAULT_DELAY
        }
    }
}
