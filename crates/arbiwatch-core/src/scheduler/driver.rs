use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::guard::{CycleGuard, CycleTicket};
use super::SchedulerSettings;
use super::state::{ForceDecision, ForceOutcome, RefreshMachine, RefreshState, next_deadline};
use crate::aggregate::{Aggregator, CycleResult};
use crate::clock::Clock;
use crate::credential::CredentialGate;
use crate::snapshot::SnapshotStore;

pub(crate) enum Command {
    ForceRefresh(oneshot::Sender<ForceOutcome>),
}

type InFlight = BoxFuture<'static, (CycleResult, CycleTicket)>;

/// Everything one cycle needs, shared by the driver task and the inline
/// idle path.
#[derive(Clone)]
pub(crate) struct CycleRunner {
    pub aggregator: Aggregator,
    pub store: SnapshotStore,
    pub guard: CycleGuard,
}

impl CycleRunner {
    /// Wait for the guard, raise `loading`, and run the aggregator.
    pub async fn run(self) -> (CycleResult, CycleTicket) {
        let ticket = self.guard.acquire().await;
        self.store.begin_cycle();
        let result = self.aggregator.run_cycle().await;
        (result, ticket)
    }
}

/// Single task owning the state machine and its timers.
pub(crate) struct Driver {
    pub machine: RefreshMachine,
    pub runner: CycleRunner,
    pub gate: CredentialGate,
    pub clock: Arc<dyn Clock>,
    pub credential_poll: Duration,
    pub tick: Duration,
    pub commands: mpsc::Receiver<Command>,
    pub state_tx: Arc<watch::Sender<RefreshState>>,
    pub cancel: CancellationToken,
}

#[derive(Default)]
struct Timers {
    in_flight: Option<InFlight>,
    credential_poll: Option<Interval>,
    countdown: Option<Interval>,
}

impl Driver {
    pub async fn run(mut self) {
        let mut timers = Timers::default();
        let mut stopping = false;

        if self.machine.start(self.gate.is_authorized()) {
            timers.in_flight = Some(self.launch_cycle());
        }
        self.publish();

        loop {
            self.arm_timers(&mut timers);

            tokio::select! {
                _ = self.cancel.cancelled(), if !stopping => {
                    stopping = true;
                    self.machine.stop();
                    if timers.in_flight.is_none() {
                        break;
                    }
                    info!(event = "core.scheduler.stop_deferred", reason = "cycle in flight");
                }
                (result, ticket) = settle(&mut timers.in_flight) => {
                    timers.in_flight = None;
                    let follow_up = self.commit(&result);
                    drop(ticket);
                    if stopping {
                        break;
                    }
                    if follow_up {
                        timers.in_flight = Some(self.launch_cycle());
                    }
                }
                Some(command) = self.commands.recv(), if !stopping => {
                    match command {
                        Command::ForceRefresh(reply) => {
                            let outcome = self.force_refresh(&mut timers);
                            let _ = reply.send(outcome);
                        }
                    }
                }
                _ = next_tick(&mut timers.credential_poll) => {
                    let authorized = self.gate.is_authorized();
                    debug!(event = "core.scheduler.credential_polled", authorized);
                    if self.machine.on_credential_poll(authorized) {
                        info!(event = "core.scheduler.credential_detected");
                        timers.in_flight = Some(self.launch_cycle());
                    }
                }
                _ = next_tick(&mut timers.countdown) => {
                    let now = self.clock.now();
                    let remaining = self.runner.store.tick(now);
                    if self.machine.on_tick(now) {
                        info!(event = "core.scheduler.deadline_reached");
                        timers.in_flight = Some(self.launch_cycle());
                    } else {
                        debug!(event = "core.scheduler.tick", countdown_seconds = remaining);
                    }
                }
            }

            self.publish();
        }

        self.machine.stop();
        self.publish();
        info!(event = "core.scheduler.stopped");
    }

    fn force_refresh(&mut self, timers: &mut Timers) -> ForceOutcome {
        match self.machine.request_refresh() {
            ForceDecision::StartCycle => {
                info!(event = "core.scheduler.force_started");
                timers.in_flight = Some(self.launch_cycle());
                ForceOutcome::Started
            }
            ForceDecision::Queued => {
                info!(event = "core.scheduler.force_queued");
                ForceOutcome::Queued
            }
            ForceDecision::Ignored | ForceDecision::RunInline => {
                info!(
                    event = "core.scheduler.force_ignored",
                    state = %self.machine.state()
                );
                ForceOutcome::Ignored
            }
        }
    }

    fn launch_cycle(&self) -> InFlight {
        info!(event = "core.scheduler.cycle_started");
        Box::pin(self.runner.clone().run())
    }

    /// Commit and move the machine on. Returns true when a follow-up is due.
    fn commit(&mut self, result: &CycleResult) -> bool {
        let now = self.clock.now();
        let server_deadline = result.server_status().map(|status| status.next_refresh_at);
        let settlement = self.machine.on_cycle_settled(now, server_deadline);
        self.runner.store.commit(result, settlement.deadline, now);

        info!(
            event = "core.scheduler.cycle_settled",
            next_refresh_at = %settlement.deadline,
            follow_up = settlement.follow_up,
            error = result.error_message().unwrap_or_default()
        );

        settlement.follow_up
    }

    /// Acquire timers on state entry and release them on exit.
    fn arm_timers(&self, timers: &mut Timers) {
        let state = self.machine.state();

        if state == RefreshState::AwaitingCredential {
            timers
                .credential_poll
                .get_or_insert_with(|| periodic(self.credential_poll));
        } else if timers.credential_poll.take().is_some() {
            debug!(event = "core.scheduler.credential_poll_cancelled");
        }

        if state == RefreshState::CountingDown {
            timers.countdown.get_or_insert_with(|| periodic(self.tick));
        } else {
            timers.countdown = None;
        }
    }

    fn publish(&self) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(event = "core.scheduler.state_changed", from = %current, to = %state);
            *current = state;
            true
        });
    }
}

fn periodic(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn settle(in_flight: &mut Option<InFlight>) -> (CycleResult, CycleTicket) {
    match in_flight {
        Some(cycle) => cycle.await,
        None => pending().await,
    }
}

/// Run one cycle in the caller's task while no driver is running.
pub(crate) async fn run_inline(
    runner: CycleRunner,
    clock: &dyn Clock,
    settings: &SchedulerSettings,
    state_tx: &watch::Sender<RefreshState>,
) -> ForceOutcome {
    if runner.guard.is_busy() {
        warn!(event = "core.scheduler.inline_waiting", reason = "cycle in flight");
    }

    state_tx.send_replace(RefreshState::Refreshing);
    let store = runner.store.clone();
    let (result, ticket) = runner.run().await;

    let now = clock.now();
    let server_deadline = result.server_status().map(|status| status.next_refresh_at);
    let deadline = next_deadline(
        now,
        server_deadline,
        settings.chrono_interval(),
        settings.server_sync,
    );
    store.commit(&result, deadline, now);
    drop(ticket);

    state_tx.send_replace(RefreshState::Idle);
    info!(
        event = "core.scheduler.inline_completed",
        next_refresh_at = %deadline,
        error = result.error_message().unwrap_or_default()
    );
    ForceOutcome::Completed
}
