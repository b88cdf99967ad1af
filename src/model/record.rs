//! Source records: what the flag and stop collaborators hand over.
//!
//! Both are read-only to the reconciler. Adapters in `crate::adapter` build
//! them from raw documents; nothing downstream guesses field names.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validated constructor. Rejects non-finite and out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

/// An operator-created annotation pinned to an absolute instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagRecord {
    pub id: String,
    pub point: Option<GeoPoint>,

    /// When the flag was recorded. `None` when the source value was malformed.
    pub timestamp: Option<Timestamp>,

    pub title: Option<String>,
    pub note: Option<String>,
}

/// A CSV-derived waypoint, usually only timed by a time-of-day string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecord {
    pub id: String,
    pub point: Option<GeoPoint>,

    /// Ordinal position within the route. Used for fallback spacing and ties.
    pub order: i64,

    pub title: Option<String>,

    /// Free text shown as the stop's note.
    pub description: Option<String>,

    /// Text fields that may embed a time of day.
    pub time_sources: TimeSources,
}

/// Candidate text fields for a stop's time of day, in preference order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSources {
    /// The structured CSV description written at ingestion.
    pub csv_description: Option<String>,

    /// The CSV description as preserved in the original row data.
    pub original_csv_description: Option<String>,

    /// The untouched `Description` column of the raw row.
    pub raw_description: Option<String>,

    /// A generic timestamp field, in whatever text form it arrived.
    pub timestamp: Option<String>,
}

impl TimeSources {
    /// The first non-empty candidate in preference order.
    pub fn preferred(&self) -> Option<&str> {
        [
            &self.csv_description,
            &self.original_csv_description,
            &self.raw_description,
            &self.timestamp,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
        .find(|s| !s.is_empty())
    }
}
