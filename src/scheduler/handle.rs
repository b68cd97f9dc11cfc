use tokio::sync::{mpsc, oneshot, watch};

use crate::models::{ConnectionStatus, HistoryEntry, HistoryStats, Reading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    RetryPending,
    /// Settings are unusable; waiting for a configuration change
    AwaitingConfig,
    Destroyed,
}

/// Read-only view of the poller, republished after every event
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: PollState,
    pub status: ConnectionStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub last_reading: Option<Reading>,
    pub stats: HistoryStats,
}

impl Snapshot {
    pub(crate) fn initial(max_retries: u32) -> Self {
        Snapshot {
            state: PollState::Idle,
            status: ConnectionStatus::Unknown,
            retry_count: 0,
            max_retries,
            last_reading: None,
            stats: HistoryStats::default(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Refresh,
    Recent(usize, oneshot::Sender<Vec<HistoryEntry>>),
    Destroy,
}

/// Cheap, cloneable control handle for a running scheduler.
///
/// Every call is a no-op once the scheduler has been destroyed.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Snapshot>,
}

impl SchedulerHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshot: watch::Receiver<Snapshot>,
    ) -> Self {
        SchedulerHandle { commands, snapshot }
    }

    /// Fetch now, unless a fetch is already in flight
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Stop the scheduler. Safe to call any number of times.
    pub fn destroy(&self) {
        let _ = self.commands.send(Command::Destroy);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.snapshot.borrow().state == PollState::Destroyed
    }

    /// Up to `n` history entries, most recent first
    pub async fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Recent(n, tx)).is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}
