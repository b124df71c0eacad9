//! Wires the production stack from a loaded configuration.

use std::sync::Arc;

use tracing::info;

use crate::aggregate::Aggregator;
use crate::config::ArbiwatchConfig;
use crate::credential::{ChainCredential, CredentialGate, CredentialSource};
use crate::scheduler::{
    ForceOutcome, RefreshScheduler, RefreshState, SchedulerError, SchedulerSettings,
};
use crate::snapshot::{Snapshot, SnapshotStore, Subscription};
use crate::sources::{FetchError, HttpTransport, ReqwestTransport};

/// One dashboard session: a scheduler and the snapshot it feeds.
///
/// This is the surface a view layer uses: read [`snapshot`](Self::snapshot),
/// [`subscribe`](Self::subscribe) to changes and call
/// [`force_refresh`](Self::force_refresh).
pub struct Dashboard {
    scheduler: RefreshScheduler,
}

impl Dashboard {
    /// Build the reqwest transport and credential chain described by `config`.
    pub fn from_config(config: &ArbiwatchConfig) -> Result<Self, FetchError> {
        let transport = Arc::new(ReqwestTransport::from_config(&config.api)?);
        let credential = Arc::new(ChainCredential::from_config(&config.credential));
        Ok(Self::with_parts(
            transport,
            credential,
            SchedulerSettings::from_config(&config.refresh),
        ))
    }

    pub fn with_parts(
        transport: Arc<dyn HttpTransport>,
        credential: Arc<dyn CredentialSource>,
        settings: SchedulerSettings,
    ) -> Self {
        let gate = CredentialGate::new(credential);
        let aggregator = Aggregator::new(transport, gate.clone(), settings.server_sync);
        let scheduler = RefreshScheduler::new(aggregator, SnapshotStore::new(), gate, settings);

        info!(
            event = "core.dashboard.create_completed",
            interval_secs = settings.interval.as_secs(),
            server_sync = settings.server_sync
        );

        Self { scheduler }
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        self.scheduler.start()
    }

    pub async fn stop(&mut self) {
        self.scheduler.stop().await
    }

    pub async fn force_refresh(&self) -> ForceOutcome {
        self.scheduler.force_refresh().await
    }

    pub fn snapshot(&self) -> Snapshot {
        self.scheduler.store().snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.scheduler.store().subscribe(listener)
    }

    pub fn state(&self) -> RefreshState {
        self.scheduler.state()
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }
}
