//! Day anchor tracking.
//!
//! The anchor is the UTC midnight of the clock's start day. It is published
//! through a [`Watch`], so downstream recomputes only run when the anchor
//! actually moves to a different day.

use std::time::Duration;

use jiff::{SignedDuration, Timestamp};

use crate::clock::SimulationClock;
use crate::model::DayAnchor;
use crate::watch::{Subscription, Watch};

/// Publishes the current [`DayAnchor`], or `None` before the clock has a
/// start time.
#[derive(Clone)]
pub struct DayAnchorTracker {
    anchor: Watch<Option<DayAnchor>>,
}

impl Default for DayAnchorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DayAnchorTracker {
    pub fn new() -> Self {
        Self {
            anchor: Watch::new(None),
        }
    }

    pub fn current(&self) -> Option<DayAnchor> {
        self.anchor.get()
    }

    /// Feed a start time from a host that has native change notification.
    ///
    /// A missing start time leaves the last anchor in place. Returns whether
    /// a new anchor was published.
    pub fn observe_start(&self, start: Option<Timestamp>) -> bool {
        let Some(anchor) = start.and_then(DayAnchor::containing) else {
            return false;
        };
        let changed = self.anchor.set(Some(anchor));
        if changed {
            log::debug!("day anchor now {anchor}");
        }
        changed
    }

    /// Read the clock's start time and publish its anchor if it changed.
    pub fn sync(&self, clock: &impl SimulationClock) -> bool {
        self.observe_start(clock.start_time())
    }

    pub fn subscribe(&self, callback: impl FnMut(&Option<DayAnchor>) + 'static) -> Subscription {
        self.anchor.subscribe(callback)
    }
}

/// Drives a [`DayAnchorTracker`] on a fixed interval, for hosts whose clock
/// has no change notification.
///
/// The host calls [`AnchorPoller::tick`] from its frame or timer loop; the
/// clock is read at most once per interval.
pub struct AnchorPoller {
    tracker: DayAnchorTracker,
    interval: SignedDuration,
    next_due: Option<Timestamp>,
}

impl AnchorPoller {
    pub fn new(tracker: DayAnchorTracker, interval: Duration) -> Self {
        Self {
            tracker,
            interval: SignedDuration::try_from(interval).unwrap_or(SignedDuration::MAX),
            next_due: None,
        }
    }

    /// Sync the tracker if the interval has elapsed. The first tick always
    /// syncs. Returns whether a new anchor was published.
    pub fn tick(&mut self, now: Timestamp, clock: &impl SimulationClock) -> bool {
        if self.next_due.is_some_and(|due| now < due) {
            return false;
        }
        self.next_due = now.checked_add(self.interval).ok();
        self.tracker.sync(clock)
    }

    pub fn tracker(&self) -> &DayAnchorTracker {
        &self.tracker
    }
}
