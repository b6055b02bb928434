//! Configuration management for fswatch.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//!
//! There is deliberately no configuration file.

mod settings;

pub use settings::{parse_delay, Config, DEFAULT_DELAY, DEFAULT_DEPTH};
