use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::sources::{SentimentRecord, TrackRecord};

/// The externally visible dashboard state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub pair_data: Vec<Value>,
    pub track_data: Vec<TrackRecord>,
    pub sentiment_data: Vec<SentimentRecord>,
    pub error: Option<String>,
    pub initialized: bool,
    pub loading: bool,
    pub last_refresh_at: Option<DateTime<Utc>>,
    pub next_refresh_at: Option<DateTime<Utc>>,
    pub countdown_seconds: u64,
}

impl Snapshot {
    pub fn countdown_label(&self) -> String {
        format_countdown(self.countdown_seconds)
    }
}

/// Whole seconds until `deadline`, rounded up and floored at zero.
pub fn countdown_seconds(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let ms = (deadline - now).num_milliseconds();
    if ms <= 0 {
        0
    } else {
        ((ms + 999) / 1000) as u64
    }
}

/// Render seconds as `"4m 59s"`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}
