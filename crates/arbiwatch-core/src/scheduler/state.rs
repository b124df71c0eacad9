use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Lifecycle state of a [`RefreshScheduler`](super::RefreshScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshState {
    /// Waiting for a credential before the first cycle.
    AwaitingCredential,
    /// Not started, or stopped.
    Idle,
    /// A cycle is in flight.
    Refreshing,
    /// Waiting for the deadline.
    CountingDown,
}

impl fmt::Display for RefreshState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshState::AwaitingCredential => "awaiting_credential",
            RefreshState::Idle => "idle",
            RefreshState::Refreshing => "refreshing",
            RefreshState::CountingDown => "counting_down",
        };
        f.write_str(name)
    }
}

/// Answer to a forced refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceOutcome {
    /// A new cycle was started by the running scheduler.
    Started,
    /// A cycle was already in flight; one follow-up cycle is queued.
    Queued,
    /// No credential yet, or the scheduler is shutting down.
    Ignored,
    /// The scheduler was idle and the cycle ran to completion in the caller.
    Completed,
}

/// What the driver should do after a forced refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceDecision {
    StartCycle,
    Queued,
    Ignored,
    RunInline,
}

/// Result of settling a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub deadline: DateTime<Utc>,
    /// A coalesced follow-up must start now.
    pub follow_up: bool,
}

/// Pure transition logic of the refresh scheduler.
///
/// Holds no timers. The driver arms timers according to [`state`](Self::state):
/// the credential poll only in `AwaitingCredential`, the countdown tick only
/// in `CountingDown`.
#[derive(Debug, Clone)]
pub struct RefreshMachine {
    state: RefreshState,
    follow_up: bool,
    deadline: Option<DateTime<Utc>>,
    interval: Duration,
    server_sync: bool,
}

impl RefreshMachine {
    pub fn new(interval: std::time::Duration, server_sync: bool) -> Self {
        Self {
            state: RefreshState::Idle,
            follow_up: false,
            deadline: None,
            interval: Duration::from_std(interval).unwrap_or(Duration::MAX),
            server_sync,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn follow_up_queued(&self) -> bool {
        self.follow_up
    }

    /// Leave `Idle`. Returns true when a cycle should start right away.
    pub fn start(&mut self, authorized: bool) -> bool {
        if self.state != RefreshState::Idle {
            return false;
        }
        self.state = if authorized {
            RefreshState::Refreshing
        } else {
            RefreshState::AwaitingCredential
        };
        self.state == RefreshState::Refreshing
    }

    /// A credential poll fired. Returns true when the credential has appeared
    /// and the first cycle should start.
    pub fn on_credential_poll(&mut self, authorized: bool) -> bool {
        if self.state == RefreshState::AwaitingCredential && authorized {
            self.state = RefreshState::Refreshing;
            return true;
        }
        false
    }

    pub fn request_refresh(&mut self) -> ForceDecision {
        match self.state {
            RefreshState::AwaitingCredential => ForceDecision::Ignored,
            RefreshState::Idle => ForceDecision::RunInline,
            RefreshState::Refreshing => {
                self.follow_up = true;
                ForceDecision::Queued
            }
            RefreshState::CountingDown => {
                self.deadline = None;
                self.state = RefreshState::Refreshing;
                ForceDecision::StartCycle
            }
        }
    }

    /// The in-flight cycle settled at `now`.
    ///
    /// The deadline is the server's when sync is enabled and it lies strictly
    /// in the future, otherwise `now + interval`.
    pub fn on_cycle_settled(
        &mut self,
        now: DateTime<Utc>,
        server_deadline: Option<DateTime<Utc>>,
    ) -> Settlement {
        let deadline = next_deadline(now, server_deadline, self.interval, self.server_sync);
        self.deadline = Some(deadline);

        let follow_up = std::mem::take(&mut self.follow_up);
        if self.state == RefreshState::Refreshing {
            self.state = if follow_up {
                RefreshState::Refreshing
            } else {
                RefreshState::CountingDown
            };
        }

        Settlement {
            deadline,
            follow_up: follow_up && self.state == RefreshState::Refreshing,
        }
    }

    /// A countdown tick fired. Returns true when the deadline has passed and
    /// a cycle should start.
    pub fn on_tick(&mut self, now: DateTime<Utc>) -> bool {
        match (self.state, self.deadline) {
            (RefreshState::CountingDown, Some(deadline)) if now >= deadline => {
                self.state = RefreshState::Refreshing;
                true
            }
            _ => false,
        }
    }

    pub fn stop(&mut self) {
        self.state = RefreshState::Idle;
        self.follow_up = false;
    }
}

pub fn next_deadline(
    now: DateTime<Utc>,
    server_deadline: Option<DateTime<Utc>>,
    interval: Duration,
    server_sync: bool,
) -> DateTime<Utc> {
    match server_deadline {
        Some(deadline) if server_sync && deadline > now => deadline,
        _ => now.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}
