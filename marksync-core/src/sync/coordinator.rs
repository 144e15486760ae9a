//! Single-flight sync coordinator.
//!
//! One [`SyncCoordinator`] owns the round state machine:
//!
//! ```text
//! Idle --request--> Running --request--> RerunPending
//!   ^                  |                      |
//!   +----- done -------+---- done, schedule --+
//! ```
//!
//! At most one round runs at a time. Requests that arrive while a round is
//! running collapse into a single follow-up, which goes through the debounce
//! timer rather than running inline.
//!
//! Triggers (timer, local edits, settings edits) all funnel into one
//! scheduler task started with [`SyncCoordinator::start`]. The scheduler keeps
//! a single deadline: [`SyncCoordinator::schedule`] re-arms it, and once it
//! fires a round runs and the deadline moves one period ahead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::builder::SnapshotBuilder;
use super::conflict::{decide, Direction, RemoteState};
use super::error::SyncError;
use super::patch::{PatchStats, TreePatcher};
use crate::adapters::{LocalTree, RemoteStore, RemoteTarget, SettingsStore, TreeEvent};
use crate::models::{now, Settings, Snapshot, Timestamp};

/// Delay before a scheduled round.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(60);
/// Interval between periodic rounds.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(600);

/// Scheduling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    pub debounce: Duration,
    pub period: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            period: DEFAULT_PERIOD,
        }
    }
}

/// Round state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Running,
    /// Running, and another round was requested meanwhile.
    RerunPending,
}

/// What a completed round did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The local tree was patched from the remote snapshot.
    Applied {
        last_update: Option<Timestamp>,
        stats: PatchStats,
    },
    /// The local tree was published.
    Pushed { last_update: Timestamp },
    /// Both sides carry the same timestamp.
    UpToDate,
}

/// Result of [`SyncCoordinator::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed(RoundOutcome),
    /// The round failed; the error is also kept as the last error.
    Failed(SyncError),
    /// A round was already running; a follow-up round will be scheduled.
    Coalesced,
}

enum Command {
    Schedule(Duration),
    Shutdown,
}

struct Shared {
    tree: Arc<dyn LocalTree>,
    remote: Arc<dyn RemoteStore>,
    settings: Arc<dyn SettingsStore>,
    options: CoordinatorOptions,
    state: Mutex<SyncState>,
    last_error: Mutex<Option<SyncError>>,
    /// Tree revision when the last round finished; changes up to here are ours.
    settled_revision: AtomicU64,
    rounds: AtomicU64,
    commands: mpsc::UnboundedSender<Command>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs sync rounds between a local tree and a remote store.
///
/// Cheap to clone; clones share the same state machine.
#[derive(Clone)]
pub struct SyncCoordinator {
    shared: Arc<Shared>,
}

impl SyncCoordinator {
    pub fn new(
        tree: Arc<dyn LocalTree>,
        remote: Arc<dyn RemoteStore>,
        settings: Arc<dyn SettingsStore>,
        options: CoordinatorOptions,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let settled_revision = AtomicU64::new(tree.revision());
        Self {
            shared: Arc::new(Shared {
                tree,
                remote,
                settings,
                options,
                state: Mutex::new(SyncState::Idle),
                last_error: Mutex::new(None),
                settled_revision,
                rounds: AtomicU64::new(0),
                commands,
                command_rx: Mutex::new(Some(command_rx)),
            }),
        }
    }

    pub fn options(&self) -> CoordinatorOptions {
        self.shared.options
    }

    pub fn state(&self) -> SyncState {
        *lock(&self.shared.state)
    }

    /// Error of the most recent failed round, cleared by a successful one.
    pub fn last_error(&self) -> Option<SyncError> {
        lock(&self.shared.last_error).clone()
    }

    /// Number of rounds started so far.
    pub fn rounds_started(&self) -> u64 {
        self.shared.rounds.load(Ordering::SeqCst)
    }

    pub async fn settings(&self) -> Result<Settings, SyncError> {
        Ok(self.shared.settings.load().await?)
    }

    /// Saves settings. A new token or remote id schedules a round right away.
    pub async fn set_settings(&self, settings: Settings) -> Result<(), SyncError> {
        let previous = self.shared.settings.load().await?;
        self.shared.settings.store(&settings).await?;
        if previous.target_differs(&settings) {
            tracing::info!("Sync target changed, scheduling immediate sync");
            self.schedule(Duration::ZERO);
        }
        Ok(())
    }

    /// Re-arms the scheduler to run a round after `delay`.
    pub fn schedule(&self, delay: Duration) {
        if self.shared.commands.send(Command::Schedule(delay)).is_err() {
            tracing::debug!("Scheduler stopped, dropping schedule request");
        }
    }

    /// Stops the scheduler task. A running round finishes first.
    pub fn shutdown(&self) {
        let _ = self.shared.commands.send(Command::Shutdown);
    }

    /// Requests a sync round.
    ///
    /// Runs the round now if idle. If one is already running, marks a rerun
    /// and returns [`RequestOutcome::Coalesced`] without waiting. Errors are
    /// recorded and returned, never propagated.
    pub async fn request(&self) -> RequestOutcome {
        if !self.try_begin() {
            tracing::debug!("Sync already running, rerun pending");
            return RequestOutcome::Coalesced;
        }

        let round = self.shared.rounds.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Starting sync round {}", round);
        let result = self.run_round().await;
        self.shared
            .settled_revision
            .store(self.shared.tree.revision(), Ordering::SeqCst);

        let outcome = match result {
            Ok(outcome) => {
                *lock(&self.shared.last_error) = None;
                RequestOutcome::Completed(outcome)
            }
            Err(e) => {
                tracing::error!("Sync failed: {}", e);
                *lock(&self.shared.last_error) = Some(e.clone());
                RequestOutcome::Failed(e)
            }
        };

        if self.finish() {
            tracing::debug!("Scheduling rerun requested during round {}", round);
            self.schedule(self.shared.options.debounce);
        }
        outcome
    }

    /// Handles a local change notification for tree `revision`.
    ///
    /// A user edit made while idle stamps `lastUpdate` with the current time
    /// so the next round publishes it. Changes made by our own rounds (at or
    /// below the settled revision, or while running) only schedule.
    pub async fn on_local_change(&self, revision: u64) {
        let ours = revision <= self.shared.settled_revision.load(Ordering::SeqCst);
        if self.state() == SyncState::Idle && !ours {
            if let Err(e) = self.stamp_local_update().await {
                tracing::warn!("Failed to record local change: {}", e);
            }
        }
        self.schedule(self.shared.options.debounce);
    }

    /// Starts the scheduler task. Returns `None` if it was already started.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let commands = lock(&self.shared.command_rx).take()?;
        let events = self.shared.tree.subscribe();
        let coordinator = self.clone();
        Some(tokio::spawn(async move {
            coordinator.run_scheduler(commands, events).await
        }))
    }

    fn try_begin(&self) -> bool {
        let mut state = lock(&self.shared.state);
        match *state {
            SyncState::Idle => {
                *state = SyncState::Running;
                true
            }
            SyncState::Running | SyncState::RerunPending => {
                *state = SyncState::RerunPending;
                false
            }
        }
    }

    /// Returns to idle; true if a rerun was requested.
    fn finish(&self) -> bool {
        let mut state = lock(&self.shared.state);
        let rerun = *state == SyncState::RerunPending;
        *state = SyncState::Idle;
        rerun
    }

    async fn stamp_local_update(&self) -> Result<(), SyncError> {
        let mut settings = self.shared.settings.load().await?;
        settings.last_update = Some(now());
        self.shared.settings.store(&settings).await?;
        tracing::debug!("Local bookmarks changed, lastUpdate = {:?}", settings.last_update);
        Ok(())
    }

    async fn run_round(&self) -> Result<RoundOutcome, SyncError> {
        let shared = &self.shared;
        let mut settings = shared.settings.load().await?;
        let token = settings.token().ok_or_else(SyncError::not_logged_in)?;
        let remote_id = settings.remote_id().ok_or_else(SyncError::no_remote_id)?;
        let target = RemoteTarget::new(remote_id, token);

        let document = shared.remote.fetch(&target).await?;
        if document.truncated {
            return Err(SyncError::RemoteTooLarge);
        }

        let direction = decide(
            settings.last_update,
            RemoteState::of(document.snapshot.as_ref()),
            now(),
        );
        tracing::debug!("Sync direction: {:?}", direction);

        match (direction, document.snapshot) {
            (Direction::ApplyRemote, Some(snapshot)) => {
                let stats = self.apply_remote(&snapshot).await?;
                settings.last_update = snapshot.last_update;
                shared.settings.store(&settings).await?;
                tracing::info!(
                    "Applied remote snapshot: {} created, {} removed, {} kept",
                    stats.created,
                    stats.removed,
                    stats.matched
                );
                Ok(RoundOutcome::Applied {
                    last_update: snapshot.last_update,
                    stats,
                })
            }
            (
                Direction::PushLocal {
                    last_update,
                    minted,
                },
                _,
            ) => {
                if minted {
                    settings.last_update = Some(last_update);
                    shared.settings.store(&settings).await?;
                }
                let snapshot = SnapshotBuilder::new(shared.tree.as_ref())
                    .build(last_update)
                    .await?;
                shared.remote.replace(&target, &snapshot).await?;
                tracing::info!("Pushed local bookmarks (lastUpdate {})", last_update);
                Ok(RoundOutcome::Pushed { last_update })
            }
            _ => {
                tracing::debug!("Bookmarks up to date");
                Ok(RoundOutcome::UpToDate)
            }
        }
    }

    async fn apply_remote(&self, snapshot: &Snapshot) -> Result<PatchStats, SyncError> {
        let tree = self.shared.tree.as_ref();
        let patcher = TreePatcher::new(tree);
        let mut stats = PatchStats::default();
        for category in tree.categories() {
            match snapshot.category(category) {
                Some(nodes) => stats += patcher.patch_category(category, nodes).await?,
                None => tracing::debug!(
                    "Remote snapshot has no '{}' category, leaving it untouched",
                    category
                ),
            }
        }
        Ok(stats)
    }

    async fn run_scheduler(
        self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: Option<broadcast::Receiver<TreeEvent>>,
    ) {
        let options = self.shared.options;
        let mut deadline = Instant::now() + options.debounce;
        tracing::info!(
            "Sync scheduler started (debounce {:?}, period {:?})",
            options.debounce,
            options.period
        );

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => {
                    tracing::debug!("Sync timer fired");
                    self.request().await;
                    deadline = Instant::now() + options.period;
                }
                command = commands.recv() => match command {
                    Some(Command::Schedule(delay)) => deadline = Instant::now() + delay,
                    Some(Command::Shutdown) | None => break,
                },
                event = next_event(&mut events) => match event {
                    Ok(event) => self.on_local_change(event.revision).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} bookmark change notifications", skipped);
                        self.on_local_change(self.shared.tree.revision()).await;
                    }
                    Err(RecvError::Closed) => events = None,
                },
            }
        }

        tracing::info!("Sync scheduler stopped");
    }
}

async fn next_event(
    events: &mut Option<broadcast::Receiver<TreeEvent>>,
) -> Result<TreeEvent, RecvError> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
