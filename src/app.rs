//! Application wiring.
//!
//! Resolves the command, installs watches, then runs the coalescer as a
//! background task and the supervisor on the calling task. Only startup can
//! fail; once the loop is running it keeps going until the process ends.

use tokio::sync::mpsc;

use crate::supervisor::Supervisor;
use crate::watcher::{install_watches, ChangeEventSource, Coalescer};
use crate::{Config, Error, Result};

/// The fswatch application.
pub struct App {
    config: Config,
}

impl App {
    /// Create an application from a validated configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until the event source goes away.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be resolved, the watcher cannot
    /// be created, or any directory cannot be watched.
    pub async fn run(self) -> Result<()> {
        let template = self.config.command_template()?;

        let mut source = ChangeEventSource::new()?;
        install_watches(&mut source, &self.config.watch_dirs, self.config.depth)?;
        let (_guard, events) = source.start();

        tracing::info!(
            command = %template,
            delay = ?self.config.delay,
            depth = self.config.depth,
            "Watching for changes"
        );

        let (settled_tx, settled_rx) = mpsc::channel(1);
        let coalescer = tokio::spawn(Coalescer::new(self.config.delay).run(events, settled_tx));

        Supervisor::new(template, self.config.kill_policy)
            .run(settled_rx)
            .await;

        coalescer
            .await
            .map_err(|e| Error::internal(format!("coalescer task failed: {e}")))
    }
}
