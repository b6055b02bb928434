//! Child process lifecycle: exactly one current instance.

#![allow(clippy::module_inception)]

use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::process::CommandTemplate;
use crate::watcher::{Settled, SettledSignal};

const LEFT_RIGHT: &str = "----------";

/// How a superseded child is stopped before its replacement starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KillPolicy {
    /// Issue a forceful kill and start the replacement without waiting for
    /// the old instance to be reaped.
    ///
    /// The old and new instance may coexist briefly while the kill lands.
    #[default]
    Signal,
    /// Request a forceful kill, then wait up to the given time for the old
    /// instance to be reaped before starting the replacement.
    WaitForExit(Duration),
}

/// Supervisor statistics.
#[derive(Debug, Default)]
pub struct SupervisorStats {
    pub launches: AtomicU64,
    pub spawn_failures: AtomicU64,
    pub kills_requested: AtomicU64,
    pub exits_ok: AtomicU64,
    pub exits_failed: AtomicU64,
    pub live: AtomicU64,
}

impl SupervisorStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> SupervisorStatsSnapshot {
        SupervisorStatsSnapshot {
            launches: self.launches.load(Ordering::Relaxed),
            spawn_failures: self.spawn_failures.load(Ordering::Relaxed),
            kills_requested: self.kills_requested.load(Ordering::Relaxed),
            exits_ok: self.exits_ok.load(Ordering::Relaxed),
            exits_failed: self.exits_failed.load(Ordering::Relaxed),
            live: self.live.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of supervisor stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorStatsSnapshot {
    pub launches: u64,
    pub spawn_failures: u64,
    pub kills_requested: u64,
    pub exits_ok: u64,
    pub exits_failed: u64,
    /// Instances started and not yet observed to exit.
    pub live: u64,
}

/// How a child ended, as seen by its waiter.
#[derive(Debug, Clone, Copy)]
pub struct ChildExit {
    pub generation: u64,
    pub status: Option<ExitStatus>,
    /// Whether the exit followed a kill request.
    pub killed: bool,
}

/// Handle to the current child.
pub struct RunningChild {
    generation: u64,
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<oneshot::Sender<()>>>,
    waiter: JoinHandle<ChildExit>,
}

impl RunningChild {
    /// Launch counter value for this child.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// OS process id, if the process had one when it was started.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Check if the child's exit has been observed.
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.waiter.is_finished()
    }

    /// Have the waiter kill the child, returning once the kill has been issued.
    ///
    /// Does not wait for the process to exit.
    async fn request_kill(&mut self) {
        let Some(tx) = self.kill_tx.take() else {
            return;
        };
        let (issued_tx, issued_rx) = oneshot::channel();
        if tx.send(issued_tx).is_err() {
            // The waiter already finished; nothing to kill.
            return;
        }
        // An error here means the child exited before the request was seen.
        let _ = issued_rx.await;
    }
}

/// Observe a child until it exits, killing it on request.
///
/// Touches nothing but the stats counters. The restart path only waits on it
/// for the kill to be issued, or for the exit when the kill policy asks for it.
async fn wait_for_exit(
    mut child: Child,
    generation: u64,
    kill_rx: oneshot::Receiver<oneshot::Sender<()>>,
    stats: Arc<SupervisorStats>,
) -> ChildExit {
    let mut killed = false;

    // A dropped sender counts as a kill request: nobody is tracking the child anymore.
    let status = tokio::select! {
        status = child.wait() => status,
        request = kill_rx => {
            killed = true;
            if let Err(e) = child.start_kill() {
                tracing::debug!(generation, error = %e, "Kill request failed");
            }
            if let Ok(issued) = request {
                let _ = issued.send(());
            }
            child.wait().await
        }
    };

    stats.live.fetch_sub(1, Ordering::Relaxed);

    match &status {
        Ok(_) if killed => {
            tracing::debug!(generation, "Stopped process exited");
        }
        Ok(status) if status.success() => {
            stats.exits_ok.fetch_add(1, Ordering::Relaxed);
            tracing::info!(generation, "{LEFT_RIGHT} {:>5} {LEFT_RIGHT}", "E N D");
        }
        Ok(status) => {
            stats.exits_failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(generation, %status, "{LEFT_RIGHT} {:>5} {LEFT_RIGHT}", "ERROR");
        }
        Err(e) => {
            stats.exits_failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(generation, error = %e, "{LEFT_RIGHT} {:>5} {LEFT_RIGHT}", "ERROR");
        }
    }

    ChildExit {
        generation,
        status: status.ok(),
        killed,
    }
}

/// Restarts the command on every settle signal.
///
/// The current-child slot is only ever written from [`Supervisor::on_settled`],
/// which runs sequentially, so it needs no lock.
pub struct Supervisor {
    template: CommandTemplate,
    kill_policy: KillPolicy,
    current: Option<RunningChild>,
    generation: u64,
    stats: Arc<SupervisorStats>,
}

impl Supervisor {
    /// Create a supervisor. Nothing is started until the first signal.
    #[must_use]
    pub fn new(template: CommandTemplate, kill_policy: KillPolicy) -> Self {
        Self {
            template,
            kill_policy,
            current: None,
            generation: 0,
            stats: SupervisorStats::new(),
        }
    }

    /// The current child, if the last launch succeeded.
    #[must_use]
    pub const fn current(&self) -> Option<&RunningChild> {
        self.current.as_ref()
    }

    /// Get current stats.
    #[must_use]
    pub fn stats(&self) -> Arc<SupervisorStats> {
        Arc::clone(&self.stats)
    }

    /// Stop the current child if it is still running, then start a new one.
    ///
    /// A failed launch is logged and leaves no current child.
    pub async fn on_settled(&mut self, signal: SettledSignal) {
        tracing::debug!(
            coalesced = signal.coalesced,
            startup = signal.is_startup(),
            "Restart triggered"
        );

        if let Some(previous) = self.current.take() {
            self.stop(previous).await;
        }

        self.generation += 1;
        let generation = self.generation;

        tracing::info!(generation, command = %self.template, "{LEFT_RIGHT} {:>5} {LEFT_RIGHT}", "START");

        let child = match self.template.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.stats.spawn_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(generation, error = %e, "Failed to start process");
                return;
            }
        };

        self.stats.launches.fetch_add(1, Ordering::Relaxed);
        self.stats.live.fetch_add(1, Ordering::Relaxed);

        let pid = child.id();
        let (kill_tx, kill_rx) = oneshot::channel();
        let waiter = tokio::spawn(wait_for_exit(
            child,
            generation,
            kill_rx,
            Arc::clone(&self.stats),
        ));

        tracing::debug!(generation, pid, "Process started");

        self.current = Some(RunningChild {
            generation,
            pid,
            kill_tx: Some(kill_tx),
            waiter,
        });
    }

    async fn stop(&self, mut previous: RunningChild) {
        if previous.has_exited() {
            return;
        }

        tracing::info!(
            generation = previous.generation,
            pid = previous.pid,
            "stop process"
        );
        self.stats.kills_requested.fetch_add(1, Ordering::Relaxed);
        previous.request_kill().await;

        if let KillPolicy::WaitForExit(timeout) = self.kill_policy {
            match tokio::time::timeout(timeout, &mut previous.waiter).await {
                Ok(Ok(exit)) => {
                    tracing::debug!(generation = exit.generation, "Previous process exited");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Process waiter failed");
                }
                Err(_) => {
                    tracing::warn!(
                        generation = previous.generation,
                        ?timeout,
                        "Previous process still running, starting anyway"
                    );
                }
            }
        }
    }

    /// Handle settle signals one at a time until the channel closes.
    ///
    /// Each signal is acknowledged only after its restart has completed.
    pub async fn run(mut self, mut settled: mpsc::Receiver<Settled>) {
        while let Some(handoff) = settled.recv().await {
            self.on_settled(handoff.signal).await;
            handoff.ack();
        }
        tracing::debug!("Settle channel closed, supervisor stopping");
    }
}
