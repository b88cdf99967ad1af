//! Day anchors and times of day.

use std::fmt;

use jiff::{SignedDuration, Timestamp, tz::TimeZone};
use serde::{Deserialize, Serialize};

/// Midnight (UTC) of the simulation's reference day.
///
/// Only constructible by truncating an instant to its UTC day, so an anchor
/// is always aligned to a day boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayAnchor(Timestamp);

impl DayAnchor {
    /// The anchor of the UTC day containing `instant`.
    ///
    /// `None` only at the very bottom of the representable range, where
    /// the day's midnight is itself out of range.
    pub fn containing(instant: Timestamp) -> Option<Self> {
        let midnight = instant.to_zoned(TimeZone::UTC).start_of_day().ok()?;
        Some(Self(midnight.timestamp()))
    }

    pub fn timestamp(self) -> Timestamp {
        self.0
    }

    /// The instant `seconds` after this midnight.
    pub fn offset_by(self, seconds: i64) -> Option<Timestamp> {
        self.0.checked_add(SignedDuration::from_secs(seconds)).ok()
    }

    /// Place a time of day on this anchor's day.
    pub fn at(self, time: TimeOfDay) -> Option<Timestamp> {
        self.offset_by(time.seconds_since_midnight())
    }
}

impl fmt::Display for DayAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A wall-clock time of day with no date or zone attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// Validated constructor: hour <= 23, minute <= 59, second <= 59.
    pub fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        (hour <= 23 && minute <= 59 && second <= 59).then_some(Self {
            hour,
            minute,
            second,
        })
    }

    /// The UTC time of day of `instant`, truncated to whole seconds.
    pub fn of_instant(instant: Timestamp) -> Self {
        let time = instant.to_zoned(TimeZone::UTC).time();
        Self {
            hour: time.hour().unsigned_abs(),
            minute: time.minute().unsigned_abs(),
            second: time.second().unsigned_abs(),
        }
    }

    pub fn seconds_since_midnight(self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}
