//! The reconciler: keeps the merged timeline in sync with its inputs.
//!
//! Three sources can change underneath the timeline: the live flag set,
//! the one-time stop load, and the day anchor. The reconciler subscribes to
//! all three and rebuilds the whole timeline from scratch on any change.
//! Rebuilding is pure and idempotent, and the output is itself a [`Watch`],
//! so consumers only hear about rebuilds that changed something.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::anchor::DayAnchorTracker;
use crate::merge::merge_timeline;
use crate::model::{DayAnchor, FlagRecord, StopRecord, TimelineEvent};
use crate::normalize::{normalize_flags, normalize_stops};
use crate::watch::{Subscription, Watch};

/// Progress of the one-time stop load.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StopLoad {
    #[default]
    Pending,
    Loaded(Vec<StopRecord>),
    Failed(String),
}

impl StopLoad {
    /// Record the outcome of a stop fetch. Failures are logged and leave
    /// the timeline with flags only.
    pub fn from_fetch<E: fmt::Display>(result: Result<Vec<StopRecord>, E>) -> Self {
        match result {
            Ok(stops) => Self::Loaded(stops),
            Err(e) => {
                log::warn!("stop load failed: {e}");
                Self::Failed(e.to_string())
            }
        }
    }

    /// Stops that may contribute to the merge. Empty until loaded.
    pub fn stops(&self) -> &[StopRecord] {
        match self {
            Self::Loaded(stops) => stops,
            Self::Pending | Self::Failed(_) => &[],
        }
    }
}

/// Build the merged timeline from one snapshot of the inputs.
pub fn reconcile(
    flags: &[FlagRecord],
    stops: &[StopRecord],
    anchor: Option<DayAnchor>,
    fallback_step_seconds: i64,
) -> Vec<TimelineEvent> {
    merge_timeline(
        normalize_stops(stops, anchor, fallback_step_seconds),
        normalize_flags(flags, anchor),
    )
}

struct Inputs {
    flags: Vec<FlagRecord>,
    stops: StopLoad,
    anchor: Option<DayAnchor>,
    fallback_step_seconds: i64,
}

impl Inputs {
    fn rebuild(&self) -> Vec<TimelineEvent> {
        let events = reconcile(
            &self.flags,
            self.stops.stops(),
            self.anchor,
            self.fallback_step_seconds,
        );
        log::debug!(
            "timeline rebuilt: {} flags, {} stops, anchor {}",
            self.flags.len(),
            self.stops.stops().len(),
            self.anchor
                .map_or_else(|| "unset".to_string(), |a| a.to_string())
        );
        events
    }
}

/// Owns the subscriptions feeding the merged timeline.
///
/// Dropping the reconciler tears every subscription down; no rebuild runs
/// after that, whatever its former inputs do.
pub struct Reconciler {
    timeline: Watch<Vec<TimelineEvent>>,
    _subscriptions: Vec<Subscription>,
}

impl Reconciler {
    pub fn attach(
        flags: &Watch<Vec<FlagRecord>>,
        stops: &Watch<StopLoad>,
        anchor: &DayAnchorTracker,
        fallback_step_seconds: i64,
    ) -> Self {
        let inputs = Rc::new(RefCell::new(Inputs {
            flags: flags.get(),
            stops: stops.get(),
            anchor: anchor.current(),
            fallback_step_seconds,
        }));
        let timeline = Watch::new(inputs.borrow().rebuild());

        let subscriptions = vec![
            flags.subscribe(on_change(&inputs, &timeline, |inputs, flags: &Vec<FlagRecord>| {
                inputs.flags.clone_from(flags);
            })),
            stops.subscribe(on_change(&inputs, &timeline, |inputs, load: &StopLoad| {
                inputs.stops.clone_from(load);
            })),
            anchor.subscribe(on_change(&inputs, &timeline, |inputs, anchor: &Option<DayAnchor>| {
                inputs.anchor = *anchor;
            })),
        ];

        Self {
            timeline,
            _subscriptions: subscriptions,
        }
    }

    /// A copy of the current merged timeline.
    pub fn events(&self) -> Vec<TimelineEvent> {
        self.timeline.get()
    }

    /// A shared handle to the merged timeline for other consumers.
    pub fn timeline(&self) -> Watch<Vec<TimelineEvent>> {
        self.timeline.clone()
    }

    pub fn subscribe(&self, callback: impl FnMut(&Vec<TimelineEvent>) + 'static) -> Subscription {
        self.timeline.subscribe(callback)
    }
}

fn on_change<T: 'static>(
    inputs: &Rc<RefCell<Inputs>>,
    timeline: &Watch<Vec<TimelineEvent>>,
    apply: impl Fn(&mut Inputs, &T) + 'static,
) -> impl FnMut(&T) + 'static {
    let inputs = Rc::clone(inputs);
    let timeline = timeline.clone();
    move |value: &T| {
        let events = {
            let mut inputs = inputs.borrow_mut();
            apply(&mut inputs, value);
            inputs.rebuild()
        };
        timeline.set(events);
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;

    use crate::model::TimeSources;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn flag(id: &str, at: &str) -> FlagRecord {
        FlagRecord {
            id: id.into(),
            point: None,
            timestamp: Some(ts(at)),
            title: None,
            note: None,
        }
    }

    fn stop(id: &str, order: i64, text: &str) -> StopRecord {
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

    fn ids(events: &[TimelineEvent]) -> Vec<String> {
        events.iter().map(|e| e.key().to_string()).collect()
    }

    struct Fixture {
        flags: Watch<Vec<FlagRecord>>,
        stops: Watch<StopLoad>,
        anchor: DayAnchorTracker,
    }

    fn fixture() -> Fixture {
        Fixture {
            flags: Watch::new(Vec::new()),
            stops: Watch::new(StopLoad::Pending),
            anchor: DayAnchorTracker::new(),
        }
    }

    impl Fixture {
        fn attach(&self) -> Reconciler {
            Reconciler::attach(&self.flags, &self.stops, &self.anchor, 5)
        }
    }

    #[test]
    fn scenario_stop_before_flag_on_anchor_day() {
        let f = fixture();
        f.anchor.observe_start(Some(ts("2024-06-10T00:00:00Z")));
        f.flags.set(vec![flag("f1", "2024-01-01T08:00:00Z")]);
        f.stops
            .set(StopLoad::Loaded(vec![stop("s1", 0, "... 07:59:00 ...")]));

        let events = f.attach().events();

        assert_eq!(ids(&events), ["stop:s1", "flag:f1"]);
        assert_eq!(events[0].sort_key, Some(ts("2024-06-10T07:59:00Z")));
        assert_eq!(events[1].sort_key, Some(ts("2024-06-10T08:00:00Z")));
    }

    #[test]
    fn flags_only_until_stops_load() {
        let f = fixture();
        f.anchor.observe_start(Some(ts("2024-06-10T06:00:00Z")));
        let reconciler = f.attach();

        f.flags.set(vec![flag("f1", "2024-01-01T08:00:00Z")]);
        assert_eq!(ids(&reconciler.events()), ["flag:f1"]);

        f.stops
            .set(StopLoad::Loaded(vec![stop("s1", 0, "09:00:00")]));
        assert_eq!(ids(&reconciler.events()), ["flag:f1", "stop:s1"]);
    }

    #[test]
    fn failed_stop_load_keeps_flags() {
        let f = fixture();
        let reconciler = f.attach();
        f.flags.set(vec![flag("f1", "2024-01-01T08:00:00Z")]);

        f.stops
            .set(StopLoad::from_fetch::<&str>(Err("permission denied")));

        assert_eq!(ids(&reconciler.events()), ["flag:f1"]);
        assert_eq!(f.stops.get(), StopLoad::Failed("permission denied".into()));
    }

    #[test]
    fn anchor_change_rebuilds_sort_keys() {
        let f = fixture();
        f.stops
            .set(StopLoad::Loaded(vec![stop("s1", 0, "14:30:00")]));
        let reconciler = f.attach();

        // No anchor yet: listed, not clickable.
        assert!(!reconciler.events()[0].is_jumpable());

        f.anchor.observe_start(Some(ts("2024-06-10T06:00:00Z")));
        assert_eq!(
            reconciler.events()[0].display_instant,
            Some(ts("2024-06-10T14:30:00Z"))
        );

        f.anchor.observe_start(Some(ts("2024-06-11T06:00:00Z")));
        assert_eq!(
            reconciler.events()[0].display_instant,
            Some(ts("2024-06-11T14:30:00Z"))
        );
    }

    #[test]
    fn consumers_only_hear_real_changes() {
        let f = fixture();
        f.anchor.observe_start(Some(ts("2024-06-10T06:00:00Z")));
        let reconciler = f.attach();
        let rebuilds = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&rebuilds);
        let _sub = reconciler.subscribe(move |_| *sink.borrow_mut() += 1);

        f.flags.set(vec![flag("f1", "2024-01-01T08:00:00Z")]);
        // Same day, later start: the anchor does not move.
        f.anchor.observe_start(Some(ts("2024-06-10T07:00:00Z")));
        // A different flag set that normalizes to the same events.
        let mut same = flag("f1", "2024-01-01T08:00:00Z");
        same.note = Some(String::new());
        assert!(f.flags.set(vec![same]));

        assert_eq!(*rebuilds.borrow(), 1);
    }

    #[test]
    fn dropped_reconciler_stops_listening() {
        let f = fixture();
        let reconciler = f.attach();
        let timeline = reconciler.timeline();
        assert_eq!(f.flags.subscriber_count(), 1);

        drop(reconciler);
        f.flags.set(vec![flag("f1", "2024-01-01T08:00:00Z")]);

        assert!(timeline.get().is_empty());
        assert_eq!(f.flags.subscriber_count(), 0);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let flags = [
            flag("f2", "2023-03-03T10:00:00Z"),
            flag("f1", "2024-01-01T08:00:00Z"),
        ];
        let stops = [stop("s2", 1, "none"), stop("s1", 0, "10:00:00")];
        let anchor = DayAnchor::containing(ts("2024-06-10T00:00:00Z"));

        let first = reconcile(&flags, &stops, anchor, 5);
        let second = reconcile(&flags, &stops, anchor, 5);

        assert_eq!(first, second);
        assert_eq!(
            ids(&first),
            ["stop:s2", "flag:f1", "stop:s1", "flag:f2"]
        );
    }
}
