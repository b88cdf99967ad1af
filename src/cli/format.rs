//! Output formatting for CLI display.

use jiff::{Timestamp, tz::TimeZone};

use trackline::jump::{JumpOutcome, JumpReport};
use trackline::sidebar::SidebarRow;

const NO_TIME: &str = "--";

pub(super) fn format_instant(instant: Option<Timestamp>, tz: &TimeZone) -> String {
    instant.map_or_else(
        || NO_TIME.to_string(),
        |t| t.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// One timeline entry: index, badge, display time, title, and the note
/// indented underneath when there is one.
pub(super) fn format_row(index: usize, row: &SidebarRow, tz: &TimeZone) -> String {
    let event = &row.event;
    let mut line = format!(
        "{index:>3}  {:<7}  {:<19}  {}",
        event.source.badge(),
        format_instant(event.display_instant, tz),
        event.title
    );
    if !row.clickable {
        line.push_str("  (not clickable)");
    }
    if !event.note.is_empty() {
        line.push_str("\n       ");
        line.push_str(&event.note);
    }
    line
}

pub(super) fn format_report(report: &JumpReport, tz: &TimeZone) -> String {
    let applied = format_instant(Some(report.applied), tz);
    match report.outcome {
        JumpOutcome::TargetSet => format!("{} → {applied} ({})", report.key, report.outcome),
        JumpOutcome::ClampedToStart | JumpOutcome::ClampedToStop => format!(
            "{} → {applied} ({}; target was {})",
            report.key,
            report.outcome,
            format_instant(Some(report.target), tz)
        ),
    }
}

#[cfg(test)]
mod tests {
    use trackline::model::{EventKey, EventSource, Placement, TimelineEvent};

    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn row(instant: Option<&str>, note: &str, clickable: bool) -> SidebarRow {
        let instant = instant.map(ts);
        SidebarRow {
            event: TimelineEvent {
                source: EventSource::Stop,
                id: "s1".into(),
                title: "Depot".into(),
                note: note.into(),
                point: None,
                display_instant: instant,
                sort_key: instant,
                order: 0,
                time_of_day: None,
                placement: Placement::StopTimeOfDay,
            },
            active: false,
            flashing: false,
            clickable,
        }
    }

    #[test]
    fn format_instant_in_zone() {
        let tz = TimeZone::fixed(jiff::tz::offset(2));
        assert_eq!(
            format_instant(Some(ts("2024-06-10T07:59:00Z")), &tz),
            "2024-06-10 09:59:00"
        );
        assert_eq!(format_instant(None, &TimeZone::UTC), "--");
    }

    #[test]
    fn format_plain_row() {
        let line = format_row(4, &row(Some("2024-06-10T07:59:00Z"), "", true), &TimeZone::UTC);
        assert_eq!(line, "  4  Stopped  2024-06-10 07:59:00  Depot");
    }

    #[test]
    fn format_unclickable_row_with_note() {
        let line = format_row(0, &row(None, "Parked", false), &TimeZone::UTC);
        assert_eq!(
            line,
            "  0  Stopped  --                   Depot  (not clickable)\n       Parked"
        );
    }

    #[test]
    fn format_reports() {
        let key = EventKey {
            source: EventSource::Flag,
            id: "f1".into(),
        };
        let set = JumpReport {
            key: key.clone(),
            target: ts("2024-06-10T08:00:00Z"),
            applied: ts("2024-06-10T08:00:00Z"),
            outcome: JumpOutcome::TargetSet,
        };
        assert_eq!(
            format_report(&set, &TimeZone::UTC),
            "flag:f1 → 2024-06-10 08:00:00 (target set)"
        );

        let clamped = JumpReport {
            key,
            target: ts("2024-01-01T08:00:00Z"),
            applied: ts("2024-06-10T06:00:00Z"),
            outcome: JumpOutcome::ClampedToStart,
        };
        assert_eq!(
            format_report(&clamped, &TimeZone::UTC),
            "flag:f1 → 2024-06-10 06:00:00 (clamped to start; target was 2024-01-01 08:00:00)"
        );
    }
}
