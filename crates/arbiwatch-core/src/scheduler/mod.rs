//! Refresh cadence: one explicit state machine driven by a single task.
//!
//! The scheduler starts in `Idle`. [`RefreshScheduler::start`] spawns the
//! driver, which either waits for a credential (`AwaitingCredential`) or
//! starts the first cycle right away (`Refreshing`). Settled cycles are
//! committed to the [`SnapshotStore`] and followed by `CountingDown` until the
//! deadline passes.

mod driver;
pub mod errors;
pub mod guard;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregate::Aggregator;
use crate::clock::{Clock, SystemClock};
use crate::config::RefreshConfig;
use crate::credential::CredentialGate;
use crate::snapshot::SnapshotStore;
use driver::{Command, CycleRunner, Driver};

pub use errors::SchedulerError;
pub use guard::{CycleGuard, CycleTicket};
pub use state::{ForceOutcome, RefreshMachine, RefreshState};

const COMMAND_BUFFER: usize = 16;

/// Timing knobs for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub credential_poll: Duration,
    pub tick: Duration,
    pub server_sync: bool,
}

impl SchedulerSettings {
    pub fn from_config(config: &RefreshConfig) -> Self {
        Self {
            interval: config.interval(),
            credential_poll: config.credential_poll(),
            tick: config.tick(),
            server_sync: config.server_sync,
        }
    }

    fn chrono_interval(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&RefreshConfig::default())
    }
}

struct Running {
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owned refresh scheduler.
///
/// No timers exist until [`start`](Self::start). Dropping the scheduler
/// cancels its driver; a cycle already in flight still completes and is
/// committed.
pub struct RefreshScheduler {
    runner: CycleRunner,
    gate: CredentialGate,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
    state_tx: Arc<watch::Sender<RefreshState>>,
    running: Option<Running>,
}

impl RefreshScheduler {
    pub fn new(
        aggregator: Aggregator,
        store: SnapshotStore,
        gate: CredentialGate,
        settings: SchedulerSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(RefreshState::Idle);
        Self {
            runner: CycleRunner {
                aggregator,
                store,
                guard: CycleGuard::new(),
            },
            gate,
            clock: Arc::new(SystemClock),
            settings,
            state_tx: Arc::new(state_tx),
            running: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.runner.store
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn state(&self) -> RefreshState {
        *self.state_tx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<RefreshState> {
        self.state_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Spawn the driver task on the current tokio runtime.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let driver = Driver {
            machine: RefreshMachine::new(self.settings.interval, self.settings.server_sync),
            runner: self.runner.clone(),
            gate: self.gate.clone(),
            clock: self.clock.clone(),
            credential_poll: self.settings.credential_poll,
            tick: self.settings.tick,
            commands: commands_rx,
            state_tx: self.state_tx.clone(),
            cancel: cancel.clone(),
        };

        info!(
            event = "core.scheduler.start_started",
            interval_secs = self.settings.interval.as_secs(),
            server_sync = self.settings.server_sync
        );

        self.running = Some(Running {
            commands: commands_tx,
            cancel,
            task: handle.spawn(driver.run()),
        });
        Ok(())
    }

    /// Stop the driver and wait for it to exit.
    ///
    /// A cycle in flight runs to completion and is committed first.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.task.await {
            warn!(event = "core.scheduler.stop_failed", error = %e);
        }
        self.state_tx.send_replace(RefreshState::Idle);
    }

    /// Ask for a cycle now.
    ///
    /// While running, the driver decides: start immediately, coalesce into
    /// the in-flight cycle's single follow-up, or ignore while awaiting a
    /// credential. While idle, one cycle runs in the caller's task.
    pub async fn force_refresh(&self) -> ForceOutcome {
        match &self.running {
            Some(running) if !running.task.is_finished() => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if running
                    .commands
                    .send(Command::ForceRefresh(reply_tx))
                    .await
                    .is_err()
                {
                    return ForceOutcome::Ignored;
                }
                reply_rx.await.unwrap_or(ForceOutcome::Ignored)
            }
            _ => {
                info!(event = "core.scheduler.force_inline");
                driver::run_inline(
                    self.runner.clone(),
                    self.clock.as_ref(),
                    &self.settings,
                    &self.state_tx,
                )
                .await
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.cancel.cancel();
        }
    }
}
