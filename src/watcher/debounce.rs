//! Burst coalescing.
//!
//! Turns a stream of raw change events into settle signals: one per burst,
//! emitted once the stream has been quiet for the configured period. Every
//! new event pushes the deadline back, so a signal always reflects the latest
//! activity rather than the first.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::events::{ChangeEvent, Settled, SettledSignal};

/// Coalescer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No burst in progress.
    Idle,
    /// A burst is in progress; fire at `deadline` unless another event lands.
    AwaitingQuiet { deadline: Instant, coalesced: usize },
}

/// Debounce state machine.
#[derive(Debug)]
pub struct Coalescer {
    quiet: Duration,
    state: State,
}

impl Coalescer {
    /// Create an idle coalescer.
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            state: State::Idle,
        }
    }

    /// When the pending signal fires, if a burst is in progress.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match self.state {
            State::Idle => None,
            State::AwaitingQuiet { deadline, .. } => Some(deadline),
        }
    }

    /// Record activity at `now`, starting a burst or extending the current one.
    pub fn observe(&mut self, now: Instant) {
        let coalesced = match self.state {
            State::Idle => 1,
            State::AwaitingQuiet { coalesced, .. } => coalesced + 1,
        };
        self.state = State::AwaitingQuiet {
            deadline: now + self.quiet,
            coalesced,
        };
    }

    /// Emit the pending signal if its deadline has passed, returning to idle.
    pub fn poll_settled(&mut self, now: Instant) -> Option<SettledSignal> {
        match self.state {
            State::AwaitingQuiet {
                deadline,
                coalesced,
            } if now >= deadline => {
                self.state = State::Idle;
                Some(SettledSignal { coalesced })
            }
            _ => None,
        }
    }

    /// Arm the synthetic startup burst so the command runs once without any change.
    fn arm_startup(&mut self, now: Instant) {
        self.state = State::AwaitingQuiet {
            deadline: now + self.quiet,
            coalesced: 0,
        };
    }

    /// Drive the state machine until either channel closes.
    ///
    /// Signals are delivered one at a time, and the coalescer waits for each
    /// to be acknowledged before looking at events again. A new signal is
    /// therefore never produced while the previous restart is still being
    /// handled; events that arrive meanwhile form the next burst. If the event
    /// stream ends mid-burst the pending signal is still delivered once its
    /// quiet period has elapsed.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<ChangeEvent>,
        settled: mpsc::Sender<Settled>,
    ) {
        self.arm_startup(Instant::now());
        let mut events_open = true;

        loop {
            let Some(deadline) = self.deadline() else {
                if !events_open {
                    break;
                }
                match events.recv().await {
                    Some(event) => {
                        tracing::debug!(kind = ?event.kind, paths = ?event.paths, "Sense first");
                        self.observe(Instant::now());
                    }
                    None => events_open = false,
                }
                continue;
            };

            tokio::select! {
                biased;
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        tracing::debug!(kind = ?event.kind, paths = ?event.paths, "Sense again");
                        self.observe(Instant::now());
                    }
                    None => events_open = false,
                },
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(signal) = self.poll_settled(Instant::now()) {
                        tracing::debug!(coalesced = signal.coalesced, "Changes settled");
                        let (handoff, done) = Settled::new(signal);
                        if settled.send(handoff).await.is_err() {
                            tracing::debug!("Settle receiver closed, stopping coalescer");
                            break;
                        }
                        // Err means the consumer dropped the handoff, which also releases us.
                        let _ = done.await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;

    const QUIET: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn event() -> ChangeEvent {
        ChangeEvent::new(EventKind::Any, "/src/main.rs")
    }

    fn spawn_coalescer() -> (mpsc::UnboundedSender<ChangeEvent>, mpsc::Receiver<Settled>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::channel(1);
        tokio::spawn(Coalescer::new(QUIET).run(events_rx, settled_tx));
        (events_tx, settled_rx)
    }

    /// Receive the next signal and acknowledge it straight away.
    async fn next_signal(settled_rx: &mut mpsc::Receiver<Settled>) -> SettledSignal {
        let handoff = settled_rx.recv().await.unwrap();
        let signal = handoff.signal;
        handoff.ack();
        signal
    }

    #[test]
    fn test_idle_has_no_deadline() {
        let mut coalescer = Coalescer::new(QUIET);
        assert!(coalescer.deadline().is_none());
        assert!(coalescer.poll_settled(Instant::now()).is_none());
    }

    #[test]
    fn test_observe_resets_deadline() {
        let start = Instant::now();
        let mut coalescer = Coalescer::new(QUIET);

        coalescer.observe(start);
        assert_eq!(coalescer.deadline(), Some(start + QUIET));

        coalescer.observe(start + ms(200));
        assert_eq!(coalescer.deadline(), Some(start + ms(700)));

        // The first deadline has passed but a newer event extended the burst.
        assert!(coalescer.poll_settled(start + ms(500)).is_none());

        let signal = coalescer.poll_settled(start + ms(700)).unwrap();
        assert_eq!(signal.coalesced, 2);
        assert!(coalescer.deadline().is_none());
    }

    #[test]
    fn test_signal_fires_once_per_burst() {
        let start = Instant::now();
        let mut coalescer = Coalescer::new(QUIET);

        coalescer.observe(start);
        assert!(coalescer.poll_settled(start + ms(500)).is_some());
        assert!(coalescer.poll_settled(start + ms(900)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_signal_without_events() {
        let start = Instant::now();
        let (_events_tx, mut settled_rx) = spawn_coalescer();

        let signal = next_signal(&mut settled_rx).await;
        assert!(signal.is_startup());
        assert!(start.elapsed() >= QUIET);
        assert!(start.elapsed() < QUIET + ms(10));

        // Nothing else arrives while the source is quiet.
        tokio::time::sleep(ms(5_000)).await;
        assert!(settled_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_signal() {
        let (events_tx, mut settled_rx) = spawn_coalescer();
        next_signal(&mut settled_rx).await;

        let burst = Instant::now();
        events_tx.send(event()).unwrap();
        tokio::time::sleep(ms(100)).await;
        events_tx.send(event()).unwrap();
        tokio::time::sleep(ms(100)).await;
        events_tx.send(event()).unwrap();

        let signal = next_signal(&mut settled_rx).await;
        assert_eq!(signal.coalesced, 3);
        assert!(burst.elapsed() >= ms(700));
        assert!(burst.elapsed() < ms(710));

        tokio::time::sleep(ms(2_000)).await;
        assert!(settled_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_bursts_yield_separate_signals() {
        let (events_tx, mut settled_rx) = spawn_coalescer();
        next_signal(&mut settled_rx).await;

        let start = Instant::now();
        events_tx.send(event()).unwrap();

        let first = next_signal(&mut settled_rx).await;
        assert_eq!(first.coalesced, 1);
        assert!(start.elapsed() >= ms(500) && start.elapsed() < ms(510));

        tokio::time::sleep_until(start + ms(1_000)).await;
        events_tx.send(event()).unwrap();

        let second = next_signal(&mut settled_rx).await;
        assert_eq!(second.coalesced, 1);
        assert!(start.elapsed() >= ms(1_500) && start.elapsed() < ms(1_510));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_during_startup_merge_with_startup_signal() {
        let (events_tx, mut settled_rx) = spawn_coalescer();
        let start = Instant::now();

        tokio::time::sleep(ms(300)).await;
        events_tx.send(event()).unwrap();

        let signal = next_signal(&mut settled_rx).await;
        assert_eq!(signal.coalesced, 1);
        assert!(start.elapsed() >= ms(800));

        tokio::time::sleep(ms(2_000)).await;
        assert!(settled_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_signal_until_previous_acknowledged() {
        let (events_tx, mut settled_rx) = spawn_coalescer();
        let held = settled_rx.recv().await.unwrap();
        assert!(held.signal.is_startup());

        // Activity while the restart is still being handled.
        for _ in 0..3 {
            events_tx.send(event()).unwrap();
            tokio::time::sleep(ms(100)).await;
        }
        tokio::time::sleep(ms(2_000)).await;
        assert!(settled_rx.try_recv().is_err());

        let acked = Instant::now();
        held.ack();

        // The queued events form one burst that starts after the acknowledgement.
        let signal = next_signal(&mut settled_rx).await;
        assert_eq!(signal.coalesced, 3);
        assert!(acked.elapsed() >= QUIET);
        assert!(acked.elapsed() < QUIET + ms(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_signal_survives_closed_source() {
        let (events_tx, mut settled_rx) = spawn_coalescer();
        next_signal(&mut settled_rx).await;

        events_tx.send(event()).unwrap();
        drop(events_tx);

        assert_eq!(next_signal(&mut settled_rx).await.coalesced, 1);
        // Coalescer exits once the source is closed and nothing is pending.
        assert!(settled_rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receiver_dropped() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (settled_tx, settled_rx) = mpsc::channel(1);
        drop(settled_rx);

        let handle = tokio::spawn(Coalescer::new(QUIET).run(events_rx, settled_tx));
        handle.await.unwrap();
        drop(events_tx);
    }
}
