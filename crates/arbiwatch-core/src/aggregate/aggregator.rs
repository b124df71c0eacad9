use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use super::types::CycleResult;
use crate::clock::{Clock, SystemClock};
use crate::credential::CredentialGate;
use crate::sources::{HttpTransport, SourceFetcher, SourceKind};

/// Runs the fetchers for one cycle and collects their outcomes.
#[derive(Clone)]
pub struct Aggregator {
    gate: CredentialGate,
    fetchers: Vec<SourceFetcher>,
    clock: Arc<dyn Clock>,
}

impl Aggregator {
    /// Build fetchers for pairs, tracking and sentiment, plus status when
    /// `server_sync` is enabled.
    pub fn new(transport: Arc<dyn HttpTransport>, gate: CredentialGate, server_sync: bool) -> Self {
        let fetchers = SourceKind::ALL
            .into_iter()
            .filter(|kind| server_sync || *kind != SourceKind::Status)
            .map(|kind| SourceFetcher::new(kind, transport.clone(), gate.clone()))
            .collect();

        Self {
            gate,
            fetchers,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sources a cycle started now would invoke.
    ///
    /// Public sources are always active. Authenticated ones only while the
    /// gate authorizes; otherwise they are omitted, which is not an error.
    pub fn active_sources(&self) -> Vec<SourceKind> {
        self.sources_for(self.gate.is_authorized())
    }

    fn sources_for(&self, authorized: bool) -> Vec<SourceKind> {
        self.fetchers
            .iter()
            .map(SourceFetcher::kind)
            .filter(|kind| authorized || !kind.requires_auth())
            .collect()
    }

    /// Run every active fetcher concurrently and wait for all of them.
    ///
    /// The credential is read once; the active set and every authenticated
    /// request use that same reading.
    pub async fn run_cycle(&self) -> CycleResult {
        let started_at = self.clock.now();
        let bearer = self.gate.bearer();
        let active = self.sources_for(bearer.is_some());
        let bearer = bearer.as_deref();

        info!(
            event = "core.aggregate.cycle_started",
            sources = ?active
        );

        let fetches = self
            .fetchers
            .iter()
            .filter(|fetcher| active.contains(&fetcher.kind()))
            .map(|fetcher| async move { (fetcher.kind(), fetcher.fetch_with(bearer).await) });

        let outcomes: BTreeMap<_, _> = join_all(fetches).await.into_iter().collect();
        let result = CycleResult::new(outcomes, started_at, self.clock.now());

        if result.is_success() {
            info!(
                event = "core.aggregate.cycle_completed",
                invoked = result.outcomes().len()
            );
        } else {
            warn!(
                event = "core.aggregate.cycle_degraded",
                invoked = result.outcomes().len(),
                failed = result.failure_count(),
                error = result.error_message().unwrap_or_default()
            );
        }

        result
    }
}
