//! Source adapters: raw collaborator documents into typed records.
//!
//! Flag and stop documents arrive as loosely shaped JSON: ids under more
//! than one key, timestamps as `{seconds, nanoseconds}` objects, RFC 3339
//! strings or epoch milliseconds, coordinates that may be missing. This is
//! the only place that knows those shapes. Choosing which text holds a
//! stop's time of day is left to `crate::extract`.

use jiff::Timestamp;
use serde_json::{Map, Value};

use crate::model::{FlagRecord, GeoPoint, StopRecord, TimeSources};

/// Why a document could not become a record at all.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AdaptError {
    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("document has no id")]
    MissingId,
}

pub type Result<T> = core::result::Result<T, AdaptError>;

/// Build a flag record from a flag document.
///
/// Only a missing id is fatal. A malformed timestamp or position leaves
/// that field empty.
pub fn flag_from_document(doc: &Value) -> Result<FlagRecord> {
    let obj = doc.as_object().ok_or(AdaptError::NotAnObject)?;
    let id = string_field(obj, "id").ok_or(AdaptError::MissingId)?;

    let timestamp = obj.get("timestamp").and_then(parse_instant);
    if timestamp.is_none() {
        log::warn!("flag {id}: missing or malformed timestamp");
    }

    Ok(FlagRecord {
        point: point_of(obj, &id),
        timestamp,
        title: string_field(obj, "title"),
        note: string_field(obj, "note"),
        id,
    })
}

/// Build a stop record from a location document.
///
/// The stop id prefers `locationId` over the document `id`.
pub fn stop_from_document(doc: &Value) -> Result<StopRecord> {
    let obj = doc.as_object().ok_or(AdaptError::NotAnObject)?;
    let id = string_field(obj, "locationId")
        .or_else(|| string_field(obj, "id"))
        .ok_or(AdaptError::MissingId)?;

    let time_sources = TimeSources {
        csv_description: string_field(obj, "csvDescription"),
        original_csv_description: nested_string(obj, "originalData", "csvDescription"),
        raw_description: nested_string(obj, "rawData", "Description"),
        timestamp: obj.get("timestamp").and_then(timestamp_text),
    };

    Ok(StopRecord {
        point: point_of(obj, &id),
        order: obj.get("order").and_then(order_of).unwrap_or(0),
        title: string_field(obj, "title"),
        description: string_field(obj, "description"),
        time_sources,
        id,
    })
}

/// Adapt the live flag set. Documents explicitly marked `isFlagged: false`
/// are not flags; documents that cannot be adapted are logged and skipped.
pub fn flags_from_documents(docs: &[Value]) -> Vec<FlagRecord> {
    docs.iter()
        .filter(|d| d.get("isFlagged").and_then(Value::as_bool) != Some(false))
        .filter_map(|d| match flag_from_document(d) {
            Ok(flag) => Some(flag),
            Err(e) => {
                log::warn!("skipping flag document: {e}");
                None
            }
        })
        .collect()
}

/// Adapt the one-time stop load. Unadaptable documents are logged and skipped.
pub fn stops_from_documents(docs: &[Value]) -> Vec<StopRecord> {
    docs.iter()
        .filter_map(|d| match stop_from_document(d) {
            Ok(stop) => Some(stop),
            Err(e) => {
                log::warn!("skipping stop document: {e}");
                None
            }
        })
        .collect()
}

/// Parse an absolute instant from the shapes the flag source produces.
pub fn parse_instant(value: &Value) -> Option<Timestamp> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(trunc_to_i64))?;
            Timestamp::from_millisecond(millis).ok()
        }
        Value::Object(obj) => {
            let seconds = obj
                .get("seconds")
                .or_else(|| obj.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanoseconds")
                .or_else(|| obj.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(0);
            Timestamp::new(seconds, nanos).ok()
        }
        _ => None,
    }
}

// Strings pass through untouched for time extraction; structured
// timestamps are rendered as RFC 3339 so their UTC time of day is visible.
fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => parse_instant(other).map(|t| t.to_string()),
    }
}

fn order_of(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(trunc_to_i64))
}

#[allow(clippy::cast_possible_truncation)]
fn trunc_to_i64(f: f64) -> i64 {
    f.trunc() as i64
}

fn point_of(obj: &Map<String, Value>, id: &str) -> Option<GeoPoint> {
    let lat = obj.get("lat").and_then(Value::as_f64);
    let lng = obj.get("lng").and_then(Value::as_f64);
    let point = lat.zip(lng).and_then(|(lat, lng)| GeoPoint::new(lat, lng));
    if point.is_none() {
        log::debug!("{id}: missing or invalid coordinates");
    }
    point
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn nested_string(obj: &Map<String, Value>, outer: &str, inner: &str) -> Option<String> {
    obj.get(outer)?.as_object().and_then(|o| string_field(o, inner))
}
