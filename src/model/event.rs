//! Timeline events: the derived, merged view of flags and stops.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{record::GeoPoint, time::TimeOfDay};

/// Which collaborator an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventSource {
    Flag,
    Stop,
}

impl EventSource {
    /// Short label shown next to each sidebar entry.
    pub fn badge(self) -> &'static str {
        match self {
            Self::Flag => "Flag",
            Self::Stop => "Stopped",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Stop => "stop",
        }
    }
}

/// How an event's instants were chosen. Kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Placement {
    /// Flag instant, sort key re-anchored onto the reference day.
    FlagInstant,

    /// Flag instant with no anchor yet; sorted by the absolute instant.
    FlagUnanchored,

    /// Stop placed by its extracted time of day.
    StopTimeOfDay,

    /// Stop placed by `order` times the fallback step.
    StopOrderFallback,

    /// Nothing to place the event with. Sorts last, not clickable.
    Unplaced,
}

/// One entry of the merged timeline.
///
/// Rebuilt from scratch whenever flags, stops or the anchor change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub source: EventSource,
    pub id: String,
    pub title: String,
    pub note: String,
    pub point: Option<GeoPoint>,

    /// The instant shown to the user and the initial jump target.
    pub display_instant: Option<Timestamp>,

    /// Day-agnostic ordering instant. Only meaningful for sorting.
    pub sort_key: Option<Timestamp>,

    /// Stop ordinal; 0 for flags.
    pub order: i64,

    /// Time of day extracted from a stop's text, kept for re-anchoring on jump.
    pub time_of_day: Option<TimeOfDay>,

    pub placement: Placement,
}

impl TimelineEvent {
    pub fn key(&self) -> EventKey {
        EventKey {
            source: self.source,
            id: self.id.clone(),
        }
    }

    /// Events without a display instant are listed but cannot be jumped to.
    pub fn is_jumpable(&self) -> bool {
        self.display_instant.is_some()
    }
}

/// Stable identity of an event across recomputes: `<source>:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub source: EventSource,
    pub id: String,
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.as_str(), self.id)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid event key '{0}': expected flag:<id> or stop:<id>")]
pub struct ParseEventKeyError(String);

impl FromStr for EventKey {
    type Err = ParseEventKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, id) = s
            .split_once(':')
            .ok_or_else(|| ParseEventKeyError(s.to_string()))?;
        let source = match source {
            "flag" => EventSource::Flag,
            "stop" => EventSource::Stop,
            _ => return Err(ParseEventKeyError(s.to_string())),
        };
        if id.is_empty() {
            return Err(ParseEventKeyError(s.to_string()));
        }
        Ok(Self {
            source,
            id: id.to_string(),
        })
    }
}
