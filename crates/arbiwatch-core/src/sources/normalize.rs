//! Payload shape classification and per-source normalization.
//!
//! Upstream responses come in a handful of shapes. [`PayloadShape::classify`]
//! names the shape once; each source then has one pure function that turns
//! the shapes it accepts into its stable record type. Normalization prefers
//! defaulting over failing.

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::warn;

use super::errors::FetchError;
use super::types::{
    NOT_AVAILABLE, NormalizedPayload, Price, SentimentRecord, ServerStatus, SourceKind,
    TrackRecord,
};

/// The structural shape of a decoded JSON response.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadShape {
    /// Top-level array.
    List(Vec<Value>),
    /// Object whose `results` field is an array.
    Wrapped(Vec<Value>),
    /// Object with a boolean `success` flag. `rest` holds every field but `data`.
    Envelope {
        success: bool,
        data: Option<Value>,
        message: Option<String>,
        rest: Map<String, Value>,
    },
    /// Any other object, read as a map of key → entry.
    Keyed(Map<String, Value>),
    /// `null`
    Empty,
    /// String, number or bool at the top level.
    Scalar(Value),
}

impl PayloadShape {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => PayloadShape::List(items),
            Value::Null => PayloadShape::Empty,
            Value::Object(mut map) => {
                if matches!(map.get("results"), Some(Value::Array(_)))
                    && let Some(Value::Array(items)) = map.remove("results")
                {
                    return PayloadShape::Wrapped(items);
                }
                if let Some(success) = map.get("success").and_then(Value::as_bool) {
                    let message = map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    let data = map.remove("data");
                    return PayloadShape::Envelope {
                        success,
                        data,
                        message,
                        rest: map,
                    };
                }
                PayloadShape::Keyed(map)
            }
            other => PayloadShape::Scalar(other),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            PayloadShape::List(_) => "array",
            PayloadShape::Wrapped(_) => "results object",
            PayloadShape::Envelope { .. } => "success envelope",
            PayloadShape::Keyed(_) => "keyed object",
            PayloadShape::Empty => "null",
            PayloadShape::Scalar(_) => "scalar",
        }
    }
}

/// Normalize a decoded response for the given source.
pub fn normalize(kind: SourceKind, raw: Value) -> Result<NormalizedPayload, FetchError> {
    let shape = PayloadShape::classify(raw);
    match kind {
        SourceKind::Pairs => normalize_pairs(shape).map(NormalizedPayload::Pairs),
        SourceKind::Tracking => Ok(NormalizedPayload::Tracking(normalize_tracking(shape))),
        SourceKind::Sentiment => normalize_sentiment(shape).map(NormalizedPayload::Sentiment),
        SourceKind::Status => normalize_status(shape).map(NormalizedPayload::Status),
    }
}

/// Pairs: an array passes through, `{results: [...]}` is unwrapped.
pub fn normalize_pairs(shape: PayloadShape) -> Result<Vec<Value>, FetchError> {
    match shape {
        PayloadShape::List(items) | PayloadShape::Wrapped(items) => Ok(items),
        PayloadShape::Envelope {
            success: true,
            data: Some(Value::Array(items)),
            ..
        } => Ok(items),
        other => Err(FetchError::malformed(format!(
            "pairs expected an array or {{results: [...]}}, got {}",
            other.describe()
        ))),
    }
}

/// Tracking: one record per key of the keyed payload, in key order.
///
/// Never fails. Anything other than a keyed object yields no records.
pub fn normalize_tracking(shape: PayloadShape) -> Vec<TrackRecord> {
    match shape {
        PayloadShape::Keyed(map) => map
            .iter()
            .map(|(coin, info)| track_record(coin, info))
            .collect(),
        PayloadShape::Empty => Vec::new(),
        other => {
            warn!(
                event = "core.normalize.tracking_unexpected_shape",
                shape = other.describe()
            );
            Vec::new()
        }
    }
}

/// Build one tracked-pair record, defaulting every missing field.
pub fn track_record(coin: &str, info: &Value) -> TrackRecord {
    TrackRecord {
        coin1: coin.to_string(),
        min_exchange: display_string(info.get("lowestExchange")),
        min_price1: price(info.get("lowestPrice")),
        max_exchange: display_string(info.get("highestExchange")),
        max_price1: price(info.get("highestPrice")),
        profit_percentage: percentage(info.get("profitPercentage")),
    }
}

fn display_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Zero or negative prices are treated the same as missing ones.
fn price(value: Option<&Value>) -> Price {
    match number(value) {
        Some(v) if v > 0.0 => Price::Quoted(v),
        _ => Price::Unavailable,
    }
}

fn percentage(value: Option<&Value>) -> f64 {
    number(value).unwrap_or(0.0)
}

/// Sentiment: `{success, data, message?}`; a bare array is accepted too.
///
/// Records come back ordered by overall score, highest first. Records
/// without a score keep their relative order after the scored ones.
pub fn normalize_sentiment(shape: PayloadShape) -> Result<Vec<SentimentRecord>, FetchError> {
    let items = match shape {
        PayloadShape::Envelope {
            success: false,
            message,
            ..
        } => {
            return Err(FetchError::Rejected {
                message: message.unwrap_or_else(|| "sentiment source reported failure".to_string()),
            });
        }
        PayloadShape::Envelope {
            success: true,
            data,
            ..
        } => match data {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                return Err(FetchError::malformed("sentiment data is not an array"));
            }
        },
        PayloadShape::List(items) => items,
        other => {
            return Err(FetchError::malformed(format!(
                "sentiment expected {{success, data}}, got {}",
                other.describe()
            )));
        }
    };

    let mut records: Vec<SentimentRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) => Some(SentimentRecord::new(fields)),
            other => {
                warn!(
                    event = "core.normalize.sentiment_record_skipped",
                    record = %other
                );
                None
            }
        })
        .collect();

    records.sort_by(|a, b| match (a.overall_sentiment(), b.overall_sentiment()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(records)
}

/// Status: `{nextRefreshTime: <epoch ms>}`, bare or inside a success
/// envelope. An envelope may carry the field at its top level or in `data`.
pub fn normalize_status(shape: PayloadShape) -> Result<ServerStatus, FetchError> {
    let millis = match shape {
        PayloadShape::Keyed(map) => number(map.get("nextRefreshTime")),
        PayloadShape::Envelope {
            success: false,
            message,
            ..
        } => {
            return Err(FetchError::Rejected {
                message: message.unwrap_or_else(|| "status source reported failure".to_string()),
            });
        }
        PayloadShape::Envelope {
            success: true,
            data,
            rest,
            ..
        } => number(rest.get("nextRefreshTime"))
            .or_else(|| number(data.as_ref().and_then(|data| data.get("nextRefreshTime")))),
        other => {
            return Err(FetchError::malformed(format!(
                "status expected an object, got {}",
                other.describe()
            )));
        }
    }
    .ok_or_else(|| FetchError::malformed("status is missing nextRefreshTime"))?;

    DateTime::from_timestamp_millis(millis as i64)
        .map(|next_refresh_at| ServerStatus { next_refresh_at })
        .ok_or_else(|| FetchError::malformed(format!("nextRefreshTime {} is out of range", millis)))
}
