//! Timeline merge: one deterministic order for flags and stops.

use std::cmp::Ordering;

use crate::model::{EventSource, TimelineEvent};

/// Merge normalized stops and flags into one ordered timeline.
///
/// Order: sort key ascending (events without one last), then stops before
/// flags, then `order`, then `id`. The comparator is total, so the result
/// does not depend on input order.
pub fn merge_timeline(
    stops: impl IntoIterator<Item = TimelineEvent>,
    flags: impl IntoIterator<Item = TimelineEvent>,
) -> Vec<TimelineEvent> {
    let mut merged: Vec<TimelineEvent> = stops.into_iter().chain(flags).collect();
    merged.sort_by(compare_events);
    merged
}

pub fn compare_events(a: &TimelineEvent, b: &TimelineEvent) -> Ordering {
    compare_sort_keys(a, b)
        .then_with(|| source_rank(a.source).cmp(&source_rank(b.source)))
        .then_with(|| a.order.cmp(&b.order))
        .then_with(|| a.id.cmp(&b.id))
}

// A missing sort key behaves as +infinity.
fn compare_sort_keys(a: &TimelineEvent, b: &TimelineEvent) -> Ordering {
    match (a.sort_key, b.sort_key) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn source_rank(source: EventSource) -> u8 {
    match source {
        EventSource::Stop => 0,
        EventSource::Flag => 1,
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use proptest::prelude::*;

    use super::*;

    use crate::model::{DayAnchor, FlagRecord, Placement, StopRecord, TimeSources};
    use crate::normalize::{normalize_flags, normalize_stops};

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn event(source: EventSource, id: &str, order: i64, key: Option<&str>) -> TimelineEvent {
        TimelineEvent {
            source,
            id: id.into(),
            title: String::new(),
            note: String::new(),
            point: None,
            display_instant: key.map(ts),
            sort_key: key.map(ts),
            order,
            time_of_day: None,
            placement: Placement::Unplaced,
        }
    }

    fn none() -> Vec<TimelineEvent> {
        Vec::new()
    }

    fn ids(events: &[TimelineEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn orders_by_sort_key() {
        let merged = merge_timeline(
            [event(EventSource::Stop, "s1", 0, Some("2024-06-10T09:00:00Z"))],
            [event(EventSource::Flag, "f1", 0, Some("2024-06-10T08:00:00Z"))],
        );
        assert_eq!(ids(&merged), ["f1", "s1"]);
    }

    #[test]
    fn stop_wins_exact_tie_regardless_of_input_order() {
        let at = Some("2024-06-10T08:00:00Z");
        let flag = event(EventSource::Flag, "a", 0, at);
        let stop = event(EventSource::Stop, "z", 9, at);

        let forward = merge_timeline([stop.clone()], [flag.clone()]);
        let reverse = merge_timeline(none(), [flag, stop]);

        assert_eq!(ids(&forward), ["z", "a"]);
        assert_eq!(ids(&reverse), ["z", "a"]);
    }

    #[test]
    fn order_then_id_break_remaining_ties() {
        let at = Some("2024-06-10T08:00:00Z");
        let merged = merge_timeline(
            [
                event(EventSource::Stop, "b", 2, at),
                event(EventSource::Stop, "c", 1, at),
                event(EventSource::Stop, "a", 2, at),
            ],
            none(),
        );
        assert_eq!(ids(&merged), ["c", "a", "b"]);
    }

    #[test]
    fn events_without_sort_key_go_last() {
        let merged = merge_timeline(
            [event(EventSource::Stop, "unplaced", 0, None)],
            [
                event(EventSource::Flag, "late", 0, Some("2024-06-10T23:59:59Z")),
                event(EventSource::Flag, "also-unplaced", 0, None),
            ],
        );
        assert_eq!(ids(&merged), ["late", "unplaced", "also-unplaced"]);
    }

    #[test]
    fn flag_from_another_day_interleaves_by_time_of_day() {
        let flags = [FlagRecord {
            id: "f1".into(),
            point: None,
            timestamp: Some(ts("2024-01-01T08:00:00Z")),
            title: None,
            note: None,
        }];
        let stops = [StopRecord {
            id: "s1".into(),
            point: None,
            order: 0,
            title: None,
            description: None,
            time_sources: TimeSources {
                csv_description: Some("Stopped 07:59:00".into()),
                ..TimeSources::default()
            },
        }];
        let anchor = DayAnchor::containing(ts("2024-06-10T00:00:00Z"));

        let merged = merge_timeline(
            normalize_stops(&stops, anchor, 5),
            normalize_flags(&flags, anchor),
        );

        assert_eq!(ids(&merged), ["s1", "f1"]);
        assert_eq!(merged[0].sort_key, Some(ts("2024-06-10T07:59:00Z")));
        assert_eq!(merged[1].sort_key, Some(ts("2024-06-10T08:00:00Z")));
    }

    fn stop_at(id: &str, order: i64, text: &str) -> StopRecord {
        StopRecord {
            id: id.into(),
            point: None,
            order,
            title: None,
            description: None,
            time_sources: TimeSources {
                csv_description: Some(text.into()),
                ..TimeSources::default()
            },
        }
    }

    /// 2000-01-01T00:00:00Z.
    const Y2K: i64 = 946_684_800;

    fn day_start(day: i64) -> Timestamp {
        Timestamp::from_second(Y2K + day * 86_400).unwrap()
    }

    fn arb_event() -> impl Strategy<Value = TimelineEvent> {
        (
            prop::bool::ANY,
            "[a-d]{1,2}",
            0i64..4,
            prop::option::of(0i64..4),
        )
            .prop_map(|(is_flag, id, order, minute)| {
                let source = if is_flag {
                    EventSource::Flag
                } else {
                    EventSource::Stop
                };
                let key = minute.map(|m| {
                    Timestamp::from_second(1_718_000_000 + m * 60).unwrap()
                });
                TimelineEvent {
                    sort_key: key,
                    display_instant: key,
                    ..event(source, &id, order, None)
                }
            })
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(events in prop::collection::vec(arb_event(), 0..24)) {
            let once = merge_timeline(events.clone(), none());
            let twice = merge_timeline(once.clone(), none());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merge_ignores_input_order(events in prop::collection::vec(arb_event(), 0..24)) {
            let mut reversed = events.clone();
            reversed.reverse();
            prop_assert_eq!(merge_timeline(events, none()), merge_timeline(none(), reversed));
        }

        #[test]
        fn flag_interleaves_by_time_of_day_on_any_anchor(
            anchor_day in 0i64..36_500,
            anchor_second in 0i64..86_400,
            flag_day in 0i64..36_500,
        ) {
            let anchor = DayAnchor::containing(
                day_start(anchor_day) + jiff::SignedDuration::from_secs(anchor_second),
            );
            let flags = [FlagRecord {
                id: "f1".into(),
                point: None,
                timestamp: Some(day_start(flag_day) + jiff::SignedDuration::from_hours(8)),
                title: None,
                note: None,
            }];
            let stops = [
                stop_at("late", 1, "Stopped 08:05:00"),
                stop_at("early", 0, "Stopped 07:59:00"),
            ];

            let merged = merge_timeline(
                normalize_stops(&stops, anchor, 5),
                normalize_flags(&flags, anchor),
            );

            prop_assert_eq!(ids(&merged), ["early", "f1", "late"]);
        }

        #[test]
        fn merged_output_is_sorted(events in prop::collection::vec(arb_event(), 0..24)) {
            let merged = merge_timeline(events, none());
            for pair in merged.windows(2) {
                prop_assert_ne!(compare_events(&pair[0], &pair[1]), Ordering::Greater);
            }
        }
    }
}
