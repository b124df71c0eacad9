use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// One named remote dataset.
///
/// Ordering is the fixed order used when reporting cycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Pairs,
    Tracking,
    Sentiment,
    Status,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Pairs,
        SourceKind::Tracking,
        SourceKind::Sentiment,
        SourceKind::Status,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Pairs => "pairs",
            SourceKind::Tracking => "tracking",
            SourceKind::Sentiment => "sentiment",
            SourceKind::Status => "status",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            SourceKind::Pairs => "/api/arbitrage",
            SourceKind::Tracking => "/api/arbitrage/arbitrack",
            SourceKind::Sentiment => "/api/crypto/sentiment",
            SourceKind::Status => "/api/arbitrage/status",
        }
    }

    /// Whether a bearer credential must be attached.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, SourceKind::Sentiment)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Display price of a tracked pair. Serializes as a number, or `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Quoted(f64),
    Unavailable,
}

impl Price {
    pub fn value(&self) -> Option<f64> {
        match self {
            Price::Quoted(v) => Some(*v),
            Price::Unavailable => None,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Quoted(v) => write!(f, "{:.2}", v),
            Price::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Quoted(v) => serializer.serialize_f64(*v),
            Price::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Placeholder for display strings and prices the upstream omitted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Best buy/sell exchanges for one tracked asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub coin1: String,
    pub min_exchange: String,
    pub min_price1: Price,
    pub max_exchange: String,
    pub max_price1: Price,
    pub profit_percentage: f64,
}

/// Trading signal derived from an overall sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Scores above this are a buy, below its negation a sell.
    pub const THRESHOLD: f64 = 0.2;

    pub fn from_score(score: f64) -> Self {
        if score > Self::THRESHOLD {
            Signal::Buy
        } else if score < -Self::THRESHOLD {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "Buy"),
            Signal::Sell => write!(f, "Sell"),
            Signal::Hold => write!(f, "Hold"),
        }
    }
}

/// Per-asset sentiment record, kept exactly as the upstream sent it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SentimentRecord {
    fields: Map<String, Value>,
}

const SYMBOL_KEYS: [&str; 3] = ["symbol", "coin", "asset"];
const SCORE_KEYS: [&str; 4] = ["overallSentiment", "overall_sentiment", "sentiment", "score"];

impl SentimentRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Asset symbol, looking through the key names upstreams commonly use.
    ///
    /// A nested `{"coin": {"symbol": "BTC"}}` is also understood.
    pub fn symbol(&self) -> Option<&str> {
        SYMBOL_KEYS.iter().find_map(|key| match self.fields.get(*key) {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(inner)) => inner.get("symbol").and_then(Value::as_str),
            _ => None,
        })
    }

    pub fn overall_sentiment(&self) -> Option<f64> {
        SCORE_KEYS.iter().find_map(|key| {
            self.fields
                .get(*key)
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
        })
    }

    pub fn signal(&self) -> Option<Signal> {
        self.overall_sentiment().map(Signal::from_score)
    }
}

/// Timing reported by the status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub next_refresh_at: DateTime<Utc>,
}

/// A source payload after shape normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPayload {
    Pairs(Vec<Value>),
    Tracking(Vec<TrackRecord>),
    Sentiment(Vec<SentimentRecord>),
    Status(ServerStatus),
}

impl NormalizedPayload {
    /// Number of records carried, for logging.
    pub fn len(&self) -> usize {
        match self {
            NormalizedPayload::Pairs(records) => records.len(),
            NormalizedPayload::Tracking(records) => records.len(),
            NormalizedPayload::Sentiment(records) => records.len(),
            NormalizedPayload::Status(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_paths_and_auth() {
        assert_eq!(SourceKind::Pairs.path(), "/api/arbitrage");
        assert_eq!(SourceKind::Tracking.path(), "/api/arbitrage/arbitrack");
        assert_eq!(SourceKind::Sentiment.path(), "/api/crypto/sentiment");
        assert_eq!(SourceKind::Status.path(), "/api/arbitrage/status");

        assert!(SourceKind::Pairs.requires_auth());
        assert!(SourceKind::Tracking.requires_auth());
        assert!(SourceKind::Status.requires_auth());
        assert!(!SourceKind::Sentiment.requires_auth());
    }

    #[test]
    fn test_price_serialization() {
        assert_eq!(serde_json::to_value(Price::Quoted(100.0)).unwrap(), json!(100.0));
        assert_eq!(serde_json::to_value(Price::Unavailable).unwrap(), json!("N/A"));
        assert_eq!(Price::Quoted(100.0).to_string(), "100.00");
    }

    #[test]
    fn test_track_record_uses_camel_case_keys() {
        let record = TrackRecord {
            coin1: "BTC".to_string(),
            min_exchange: "A".to_string(),
            min_price1: Price::Quoted(100.0),
            max_exchange: "B".to_string(),
            max_price1: Price::Quoted(110.0),
            profit_percentage: 9.1,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "coin1": "BTC",
                "minExchange": "A",
                "minPrice1": 100.0,
                "maxExchange": "B",
                "maxPrice1": 110.0,
                "profitPercentage": 9.1
            })
        );
    }

    #[test]
    fn test_signal_thresholds() {
        assert_eq!(Signal::from_score(0.5), Signal::Buy);
        assert_eq!(Signal::from_score(0.2), Signal::Hold);
        assert_eq!(Signal::from_score(0.0), Signal::Hold);
        assert_eq!(Signal::from_score(-0.2), Signal::Hold);
        assert_eq!(Signal::from_score(-0.21), Signal::Sell);
    }

    #[test]
    fn test_sentiment_record_accessors() {
        let Value::Object(fields) = json!({
            "coin": {"symbol": "ETH", "name": "Ethereum"},
            "overallSentiment": 0.35
        }) else {
            unreachable!()
        };
        let record = SentimentRecord::new(fields);
        assert_eq!(record.symbol(), Some("ETH"));
        assert_eq!(record.overall_sentiment(), Some(0.35));
        assert_eq!(record.signal(), Some(Signal::Buy));
    }

    #[test]
    fn test_sentiment_record_serializes_verbatim() {
        let Value::Object(fields) = json!({"symbol": "BTC", "extra": [1, 2]}) else {
            unreachable!()
        };
        let record = SentimentRecord::new(fields);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"symbol": "BTC", "extra": [1, 2]})
        );
        assert_eq!(record.signal(), None);
    }
}
