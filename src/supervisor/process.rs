//! Command template for launching the supervised process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::SupervisorError;

/// Immutable description of the command to run.
///
/// Every launch builds a fresh [`Command`] from the template; the template
/// itself is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Create a template from an executable path and its arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Executable path.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Build a fresh command.
    ///
    /// Stdout and stderr are inherited from fswatch, stdin is closed. The child
    /// is killed if its handle is dropped without being reaped.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }

    /// Start a new instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    pub fn spawn(&self) -> Result<Child, SupervisorError> {
        self.command()
            .spawn()
            .map_err(|e| SupervisorError::SpawnFailed {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
