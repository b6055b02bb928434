//! Change event source backed by notify-rs.

use std::path::Path;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::events::ChangeEvent;
use super::installer::WatchRegistry;
use crate::error::WatcherError;
use crate::Result;

/// Forwards backend callbacks onto the event and error channels.
///
/// Runs on the backend's own thread, so it only ever does non-blocking sends.
pub struct EventSink {
    events_tx: mpsc::UnboundedSender<ChangeEvent>,
    errors_tx: mpsc::UnboundedSender<notify::Error>,
}

impl EventSink {
    /// Create a sink and the receiving ends of its two channels.
    #[must_use]
    pub fn channel() -> (
        Self,
        mpsc::UnboundedReceiver<ChangeEvent>,
        mpsc::UnboundedReceiver<notify::Error>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        (
            Self {
                events_tx,
                errors_tx,
            },
            events_rx,
            errors_rx,
        )
    }
}

impl notify::EventHandler for EventSink {
    fn handle_event(&mut self, event: notify::Result<notify::Event>) {
        // Send failures mean the receiver is gone and we are shutting down.
        match event {
            Ok(event) => {
                let _ = self.events_tx.send(ChangeEvent::from(event));
            }
            Err(e) => {
                let _ = self.errors_tx.send(e);
            }
        }
    }
}

/// Log and discard watch errors until the error channel closes.
///
/// Returns how many errors were absorbed.
pub async fn drain_errors(mut errors: mpsc::UnboundedReceiver<notify::Error>) -> u64 {
    let mut absorbed = 0;
    while let Some(e) = errors.recv().await {
        absorbed += 1;
        tracing::warn!(error = %e, paths = ?e.paths, "Watch error");
    }
    absorbed
}

/// Keeps the backend watcher and its error drain alive.
pub struct WatchGuard {
    _watcher: RecommendedWatcher,
    error_drain: JoinHandle<u64>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.error_drain.abort();
    }
}

/// File system change source.
///
/// Directories are registered one at a time, non-recursively; depth is the
/// installer's job.
pub struct ChangeEventSource {
    watcher: RecommendedWatcher,
    events_rx: mpsc::UnboundedReceiver<ChangeEvent>,
    errors_rx: mpsc::UnboundedReceiver<notify::Error>,
}

impl ChangeEventSource {
    /// Create a new change source.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend watcher cannot be created.
    pub fn new() -> Result<Self> {
        let (sink, events_rx, errors_rx) = EventSink::channel();

        let watcher = notify::recommended_watcher(sink)
            .map_err(|e| WatcherError::InitFailed(e.to_string()))?;

        tracing::info!("Watcher initialized");

        Ok(Self {
            watcher,
            events_rx,
            errors_rx,
        })
    }

    /// Start draining errors and hand out the event stream.
    ///
    /// Must be called from within a tokio runtime. The returned guard has to
    /// be kept alive for events to keep flowing.
    #[must_use]
    pub fn start(self) -> (WatchGuard, mpsc::UnboundedReceiver<ChangeEvent>) {
        let error_drain = tokio::spawn(drain_errors(self.errors_rx));
        (
            WatchGuard {
                _watcher: self.watcher,
                error_drain,
            },
            self.events_rx,
        )
    }
}

impl WatchRegistry for ChangeEventSource {
    fn register(&mut self, path: &Path) -> Result<()> {
        self.watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| WatcherError::watch_failed(path, e))?;
        Ok(())
    }
}
