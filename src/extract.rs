//! Time extraction: find a time of day inside loosely structured stop text.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{TimeOfDay, TimeSources};

static HH_MM_SS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{2}):([0-9]{2}):([0-9]{2})").expect("static pattern"));

/// Extract a time of day from a stop's time sources.
///
/// Only the first non-empty source is read. A later source is not
/// consulted when the preferred one carries no valid time.
pub fn extract_time_of_day(sources: &TimeSources) -> Option<TimeOfDay> {
    sources.preferred().and_then(parse_time_of_day)
}

/// Find the first `HH:MM:SS` substring and validate its ranges.
///
/// No timezone interpretation: `"2024-01-01T09:30:00+02:00"` yields
/// 09:30:00 as written.
pub fn parse_time_of_day(text: &str) -> Option<TimeOfDay> {
    let caps = HH_MM_SS.captures(text)?;
    let field = |i: usize| caps.get(i)?.as_str().parse::<u8>().ok();
    TimeOfDay::new(field(1)?, field(2)?, field(3)?)
}
