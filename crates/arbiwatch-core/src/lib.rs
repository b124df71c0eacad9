//! arbiwatch-core: refresh orchestration for an arbitrage signal dashboard
//!
//! This library holds the business logic behind the arbiwatch CLI: credential
//! gating, per-source fetch and normalization, cycle aggregation, the refresh
//! scheduler and the snapshot store consumers read from.
//!
//! # Main Entry Points
//!
//! - [`Dashboard`] - Wire and drive a full session from configuration
//! - [`scheduler::RefreshScheduler`] - Refresh cadence state machine
//! - [`snapshot::SnapshotStore`] - Latest merged snapshot and listeners
//! - [`sources::SourceFetcher`] - One remote read plus normalization

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod credential;
pub mod dashboard;
pub mod errors;
pub mod events;
pub mod logging;
pub mod scheduler;
pub mod snapshot;
pub mod sources;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root for convenience
pub use aggregate::{Aggregator, CycleResult};
pub use config::ArbiwatchConfig;
pub use credential::CredentialGate;
pub use dashboard::Dashboard;
pub use scheduler::{ForceOutcome, RefreshScheduler, RefreshState, SchedulerSettings};
pub use snapshot::{Snapshot, SnapshotStore};
pub use sources::{FetchError, SourceKind};

// Re-export logging initialization
pub use logging::init_logging;
