//! Error types and Result aliases for fswatch.
//!
//! Only startup failures ever reach `main` as errors. Everything that happens
//! after the watch loop is running is logged and absorbed where it occurs.

use thiserror::Error;

/// Result type alias using fswatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fswatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Child process supervision error.
    #[error("supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The underlying notification backend could not be created.
    #[error("failed to create watcher: {0}")]
    InitFailed(String),

    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Directory traversal failed while installing watches.
    #[error("failed to walk '{path}': {reason}")]
    WalkFailed { path: String, reason: String },
}

/// Child process errors.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// No command was given.
    #[error("no command to run")]
    EmptyCommand,

    /// The executable could not be found on the search path.
    #[error("command '{program}' not found: {reason}")]
    CommandNotFound { program: String, reason: String },

    /// The executable was found but the process could not be started.
    #[error("failed to start '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl WatcherError {
    /// Create a watch-failed error for a path.
    pub fn watch_failed(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::WatchFailed {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests;
