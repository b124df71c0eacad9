pub mod store;
pub mod types;

pub use store::{SnapshotStore, Subscription};
pub use types::{Snapshot, countdown_seconds, format_countdown};
