//! The simulation clock the timeline reads from and seeks.
//!
//! The clock itself belongs to the viewer. The reconciler only needs its
//! bounds to derive the day anchor and clamp jumps, plus two mutators.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// What the reconciler needs from the viewer's clock.
///
/// Bounds are `None` until the viewer has loaded a simulation window.
pub trait SimulationClock {
    fn start_time(&self) -> Option<Timestamp>;
    fn stop_time(&self) -> Option<Timestamp>;
    fn current_time(&self) -> Option<Timestamp>;
    fn is_playing(&self) -> bool;

    fn set_current_time(&mut self, instant: Timestamp);
    fn pause(&mut self);
}

/// The start and stop bounds of a loaded simulation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockWindow {
    pub start: Timestamp,
    pub stop: Timestamp,
}

/// An in-memory clock: used by the CLI session and by hosts that own
/// their clock state directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualClock {
    pub window: Option<ClockWindow>,
    pub current: Option<Timestamp>,
    #[serde(default)]
    pub playing: bool,
}

impl ManualClock {
    /// A clock over `start..=stop`, positioned at `start` and paused.
    pub fn new(start: Timestamp, stop: Timestamp) -> Self {
        Self {
            window: Some(ClockWindow { start, stop }),
            current: Some(start),
            playing: false,
        }
    }

    /// Load a new simulation window, e.g. after new data arrives.
    ///
    /// The current time is kept when it still falls inside the window.
    pub fn load_window(&mut self, start: Timestamp, stop: Timestamp) {
        self.window = Some(ClockWindow { start, stop });
        let inside = self.current.is_some_and(|t| t >= start && t <= stop);
        if !inside {
            self.current = Some(start);
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }
}

impl SimulationClock for ManualClock {
    fn start_time(&self) -> Option<Timestamp> {
        self.window.map(|w| w.start)
    }

    fn stop_time(&self) -> Option<Timestamp> {
        self.window.map(|w| w.stop)
    }

    fn current_time(&self) -> Option<Timestamp> {
        self.current
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn set_current_time(&mut self, instant: Timestamp) {
        self.current = Some(instant);
    }

    fn pause(&mut self) {
        self.playing = false;
    }
}
