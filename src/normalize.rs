//! Event normalization: flags and stops into [`TimelineEvent`]s.
//!
//! Both transforms are pure functions of their records and the current day
//! anchor. A record that cannot be placed still becomes an event, just one
//! without instants, so a bad record never takes the batch down with it.

use crate::extract::extract_time_of_day;
use crate::model::{
    DayAnchor, EventSource, FlagRecord, Placement, StopRecord, TimeOfDay, TimelineEvent,
};

/// Spacing between stops that carry no parseable time of day.
pub const DEFAULT_FALLBACK_STEP_SECONDS: i64 = 5;

const DEFAULT_FLAG_TITLE: &str = "Flagged point";
const DEFAULT_STOP_TITLE: &str = "Stopped location";

pub fn normalize_flags(flags: &[FlagRecord], anchor: Option<DayAnchor>) -> Vec<TimelineEvent> {
    flags.iter().map(|f| normalize_flag(f, anchor)).collect()
}

pub fn normalize_stops(
    stops: &[StopRecord],
    anchor: Option<DayAnchor>,
    fallback_step_seconds: i64,
) -> Vec<TimelineEvent> {
    stops
        .iter()
        .map(|s| normalize_stop(s, anchor, fallback_step_seconds))
        .collect()
}

/// A flag keeps its true instant for display. Its sort key is the same time
/// of day moved onto the anchor's day, so flags recorded on another date
/// still interleave with stops by time of day.
pub fn normalize_flag(flag: &FlagRecord, anchor: Option<DayAnchor>) -> TimelineEvent {
    let (sort_key, placement) = match (flag.timestamp, anchor) {
        (None, _) => {
            log::warn!("flag {} has no usable timestamp; listing it last", flag.id);
            (None, Placement::Unplaced)
        }
        (Some(instant), None) => (Some(instant), Placement::FlagUnanchored),
        (Some(instant), Some(anchor)) => (
            anchor.at(TimeOfDay::of_instant(instant)),
            Placement::FlagInstant,
        ),
    };

    TimelineEvent {
        source: EventSource::Flag,
        id: flag.id.clone(),
        title: display_text(flag.title.as_deref(), DEFAULT_FLAG_TITLE),
        note: flag.note.clone().unwrap_or_default(),
        point: flag.point,
        display_instant: flag.timestamp,
        sort_key,
        order: 0,
        time_of_day: None,
        placement,
    }
}

/// A stop is placed on the anchor's day by its extracted time of day, or by
/// `order * fallback_step_seconds` when its text has none. Without an anchor
/// it gets no instants at all and is listed but not clickable.
pub fn normalize_stop(
    stop: &StopRecord,
    anchor: Option<DayAnchor>,
    fallback_step_seconds: i64,
) -> TimelineEvent {
    let time_of_day = extract_time_of_day(&stop.time_sources);

    let (instant, placement) = match (anchor, time_of_day) {
        (None, _) => (None, Placement::Unplaced),
        (Some(anchor), Some(time)) => (anchor.at(time), Placement::StopTimeOfDay),
        (Some(anchor), None) => {
            log::debug!(
                "stop {} has no time of day; spacing by order {}",
                stop.id,
                stop.order
            );
            let offset = stop.order.saturating_mul(fallback_step_seconds);
            (anchor.offset_by(offset), Placement::StopOrderFallback)
        }
    };

    TimelineEvent {
        source: EventSource::Stop,
        id: stop.id.clone(),
        title: display_text(stop.title.as_deref(), DEFAULT_STOP_TITLE),
        note: stop.description.clone().unwrap_or_default(),
        point: stop.point,
        display_instant: instant,
        sort_key: instant,
        order: stop.order,
        time_of_day,
        placement,
    }
}

fn display_text(text: Option<&str>, default: &str) -> String {
    text.filter(|t| !t.is_empty()).unwrap_or(default).to_string()
}
