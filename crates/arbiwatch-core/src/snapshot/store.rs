use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tracing::info;

use super::types::{Snapshot, countdown_seconds};
use crate::aggregate::CycleResult;
use crate::sources::NormalizedPayload;

type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct Inner {
    snapshot: Snapshot,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
}

/// Owner of the dashboard snapshot. Cloning shares the same store.
///
/// Every write goes through a method here. Listeners run synchronously after
/// each write, outside the lock, so they may read the store again.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SnapshotStore")
            .field("snapshot", &inner.snapshot)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    /// Register `listener`; it is called with the new snapshot after every
    /// change until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(id, Arc::new(listener));

        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Mark a cycle as in flight.
    pub fn begin_cycle(&self) {
        self.update(|snapshot| snapshot.loading = true);
    }

    /// Merge one cycle's outcomes and install the next deadline.
    ///
    /// Succeeded sources overwrite their field. Failed and omitted sources
    /// keep the previous value. `error` reflects only this cycle. The
    /// countdown is recomputed against `now` in the same write, so listeners
    /// see one notification per commit.
    pub fn commit(&self, result: &CycleResult, deadline: DateTime<Utc>, now: DateTime<Utc>) {
        let error = result.error_message();

        self.update(|snapshot| {
            for outcome in result.outcomes().values() {
                match outcome {
                    Ok(NormalizedPayload::Pairs(records)) => snapshot.pair_data = records.clone(),
                    Ok(NormalizedPayload::Tracking(records)) => {
                        snapshot.track_data = records.clone()
                    }
                    Ok(NormalizedPayload::Sentiment(records)) => {
                        snapshot.sentiment_data = records.clone()
                    }
                    // Timing arrives through `deadline`.
                    Ok(NormalizedPayload::Status(_)) | Err(_) => {}
                }
            }
            snapshot.error = error.clone();
            snapshot.initialized = true;
            snapshot.loading = false;
            snapshot.last_refresh_at = Some(result.finished_at);
            snapshot.next_refresh_at = Some(deadline);
            snapshot.countdown_seconds = countdown_seconds(deadline, now);
        });

        info!(
            event = "core.snapshot.committed",
            sources = result.outcomes().len(),
            failed = result.failure_count(),
            next_refresh_at = %deadline
        );
    }

    /// Recompute the countdown from the wall clock. Returns the new value.
    pub fn tick(&self, now: DateTime<Utc>) -> u64 {
        let mut countdown = 0;
        self.update(|snapshot| {
            snapshot.countdown_seconds = snapshot
                .next_refresh_at
                .map(|deadline| countdown_seconds(deadline, now))
                .unwrap_or(0);
            countdown = snapshot.countdown_seconds;
        });
        countdown
    }

    fn update(&self, apply: impl FnOnce(&mut Snapshot)) {
        let (snapshot, listeners) = {
            let mut inner = self.lock();
            apply(&mut inner.snapshot);
            let listeners: Vec<Listener> = inner.listeners.values().cloned().collect();
            (inner.snapshot.clone(), listeners)
        };

        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    store: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}
