//! Jump resolution: seek the simulation clock to a selected event.
//!
//! Flags jump to the real instant they were recorded. Stops with a time of
//! day are re-anchored on the clock's *current* start day at jump time, so
//! a reference day that moved after the timeline was built is honored.
//! Everything else jumps to its normalized display instant. The target is
//! then clamped into the clock window and playback is paused.

use std::fmt;

use jiff::Timestamp;
use serde::Serialize;

use crate::clock::SimulationClock;
use crate::model::{DayAnchor, EventKey, EventSource, TimelineEvent};

/// How a jump target related to the clock window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpOutcome {
    ClampedToStart,
    ClampedToStop,
    TargetSet,
}

impl fmt::Display for JumpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ClampedToStart => "clamped to start",
            Self::ClampedToStop => "clamped to stop",
            Self::TargetSet => "target set",
        })
    }
}

/// What a jump did to the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpReport {
    pub key: EventKey,

    /// The resolved target before clamping.
    pub target: Timestamp,

    /// The instant the clock was actually set to.
    pub applied: Timestamp,

    pub outcome: JumpOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpState {
    #[default]
    Idle,
    Resolving,
    Applied,
}

/// Resolves selected events to clock seeks.
///
/// Every jump runs `Idle -> Resolving -> Applied -> Idle` synchronously;
/// there is no failure exit once resolving starts.
#[derive(Debug, Default)]
pub struct JumpResolver {
    state: JumpState,
    last: Option<JumpReport>,
}

impl JumpResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> JumpState {
        self.state
    }

    /// The report of the most recent applied jump.
    pub fn last_report(&self) -> Option<&JumpReport> {
        self.last.as_ref()
    }

    /// Resolve `event` against the clock's current window, seek, and pause.
    ///
    /// Returns `None`, leaving the clock untouched, when the event has no
    /// instant to jump to or the clock has no window yet.
    pub fn resolve_and_jump(
        &mut self,
        event: &TimelineEvent,
        clock: &mut impl SimulationClock,
    ) -> Option<JumpReport> {
        let (Some(start), Some(stop)) = (clock.start_time(), clock.stop_time()) else {
            log::debug!("jump to {} ignored: clock has no window", event.key());
            return None;
        };
        let Some(fallback) = event.display_instant else {
            log::debug!("jump to {} ignored: event is not placed", event.key());
            return None;
        };

        self.enter(JumpState::Resolving);
        let target = resolve_target(event, Some(start)).unwrap_or(fallback);
        let (applied, outcome) = clamp(target, start, stop);
        clock.set_current_time(applied);
        clock.pause();
        self.enter(JumpState::Applied);

        log::debug!(
            "jump to {} ({}): target {target}, window {start}..{stop}, {outcome}",
            event.key(),
            event.title
        );
        let report = JumpReport {
            key: event.key(),
            target,
            applied,
            outcome,
        };
        self.last = Some(report.clone());
        self.enter(JumpState::Idle);
        Some(report)
    }

    fn enter(&mut self, next: JumpState) {
        log::trace!("jump resolver {:?} -> {next:?}", self.state);
        self.state = next;
    }
}

/// The instant an event should seek to, given the clock's current start.
pub fn resolve_target(event: &TimelineEvent, clock_start: Option<Timestamp>) -> Option<Timestamp> {
    match (event.source, event.time_of_day) {
        (EventSource::Stop, Some(time)) => clock_start
            .and_then(DayAnchor::containing)
            .and_then(|anchor| anchor.at(time))
            .or(event.display_instant),
        _ => event.display_instant,
    }
}

/// Clamp `target` into `start..=stop`.
pub fn clamp(target: Timestamp, start: Timestamp, stop: Timestamp) -> (Timestamp, JumpOutcome) {
    if target < start {
        (start, JumpOutcome::ClampedToStart)
    } else if target > stop {
        (stop, JumpOutcome::ClampedToStop)
    } else {
        (target, JumpOutcome::TargetSet)
    }
}
