use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct GuardState {
    busy: AtomicBool,
    released: Notify,
}

/// Single-flight guard around aggregator runs.
///
/// Shared between the scheduler's driver task and the inline path used when
/// the scheduler is idle. At most one [`CycleTicket`] exists at a time.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    state: Arc<GuardState>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy.load(Ordering::Acquire)
    }

    pub fn try_acquire(&self) -> Option<CycleTicket> {
        self.state
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CycleTicket {
                state: self.state.clone(),
            })
    }

    /// Wait until the current holder releases, then take the ticket.
    pub async fn acquire(&self) -> CycleTicket {
        loop {
            // Registered before the check so a release in between is not missed.
            let released = self.state.released.notified();
            if let Some(ticket) = self.try_acquire() {
                return ticket;
            }
            released.await;
        }
    }
}

/// Proof of holding the guard. Released on drop.
#[derive(Debug)]
pub struct CycleTicket {
    state: Arc<GuardState>,
}

impl Drop for CycleTicket {
    fn drop(&mut self) {
        self.state.busy.store(false, Ordering::Release);
        self.state.released.notify_waiters();
    }
}
