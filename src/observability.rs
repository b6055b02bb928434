//! Structured logging configuration.
//!
//! Logging goes through the `tracing` facade. The subscriber is installed once
//! at startup, plain text or JSON, with `RUST_LOG` taking precedence over the
//! configured level.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Tracing configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Build from CLI flags. `verbose` forces at least debug output.
    #[must_use]
    pub fn from_flags(level: &str, verbose: bool, json: bool) -> Self {
        let coarse = matches!(level.to_lowercase().as_str(), "info" | "warn" | "error");
        let level = if verbose && coarse {
            "debug".to_string()
        } else {
            level.to_string()
        };
        Self { level, json }
    }
}

/// Initialize tracing with the given configuration.
///
/// # Panics
///
/// Panics if tracing subscriber has already been initialized in this process.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!(
        "Tracing initialized: level={}, json={}",
        config.level,
        config.json
    );
}
