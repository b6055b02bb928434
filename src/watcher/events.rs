//! Change and settle event types.

#![allow(clippy::missing_const_for_fn)]

use std::path::PathBuf;

use tokio::sync::oneshot;

/// A raw notification that something changed under a watched directory.
///
/// The restart logic treats every event the same way. Kind and paths are kept
/// only so bursts can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// What the backend reported.
    pub kind: notify::EventKind,
    /// Paths involved in the change.
    pub paths: Vec<PathBuf>,
}

impl ChangeEvent {
    /// Create an event for a single path.
    #[must_use]
    pub fn new(kind: notify::EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            paths: vec![path.into()],
        }
    }

    /// Get the primary path associated with this event, if any.
    #[must_use]
    pub fn path(&self) -> Option<&PathBuf> {
        self.paths.first()
    }
}

impl From<notify::Event> for ChangeEvent {
    fn from(event: notify::Event) -> Self {
        Self {
            kind: event.kind,
            paths: event.paths,
        }
    }
}

/// Token meaning "the quiet period has elapsed since the last change".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledSignal {
    /// Raw events folded into this signal. Zero for the startup signal.
    pub coalesced: usize,
}

impl SettledSignal {
    /// The synthetic signal emitted once at startup.
    #[must_use]
    pub fn startup() -> Self {
        Self { coalesced: 0 }
    }

    /// Check if this is the startup signal.
    #[must_use]
    pub fn is_startup(&self) -> bool {
        self.coalesced == 0
    }
}

/// A settle signal handed to its consumer, who acknowledges once the restart
/// it triggered is done.
///
/// Dropping it without calling [`Settled::ack`] also releases the producer.
#[derive(Debug)]
pub struct Settled {
    pub signal: SettledSignal,
    done: oneshot::Sender<()>,
}

impl Settled {
    /// Pair a signal with the receiver that resolves on acknowledgement.
    #[must_use]
    pub fn new(signal: SettledSignal) -> (Self, oneshot::Receiver<()>) {
        let (done, done_rx) = oneshot::channel();
        (Self { signal, done }, done_rx)
    }

    /// Report that the signal has been fully handled.
    pub fn ack(self) {
        let _ = self.done.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, EventKind};

    #[test]
    fn test_event_from_notify() {
        let raw = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/src/main.rs"));
        let event = ChangeEvent::from(raw);

        assert_eq!(event.kind, EventKind::Create(CreateKind::File));
        assert_eq!(event.path(), Some(&PathBuf::from("/src/main.rs")));
    }

    #[test]
    fn test_event_without_paths() {
        let event = ChangeEvent::from(notify::Event::new(EventKind::Any));
        assert!(event.path().is_none());
    }

    #[tokio::test]
    async fn test_settled_ack() {
        let (settled, done) = Settled::new(SettledSignal { coalesced: 2 });
        assert_eq!(settled.signal.coalesced, 2);
        settled.ack();
        assert!(done.await.is_ok());
    }

    #[tokio::test]
    async fn test_settled_dropped_releases_producer() {
        let (settled, done) = Settled::new(SettledSignal::startup());
        drop(settled);
        assert!(done.await.is_err());
    }

    #[test]
    fn test_startup_signal() {
        assert!(SettledSignal::startup().is_startup());
        assert!(!SettledSignal { coalesced: 3 }.is_startup());
    }
}
