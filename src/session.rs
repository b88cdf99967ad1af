//! Session snapshots: a saved (clock, flags, stops) triple for offline use.
//!
//! A snapshot file is plain JSON:
//!
//! ```text
//! {
//!   "clock": { "window": { "start": "...", "stop": "..." }, "current": "..." },
//!   "flags": [ <flag documents> ],
//!   "stops": [ <location documents> ]   // omitted: stops still loading
//! }
//! ```
//!
//! Documents are kept raw and go through `crate::adapter` on open, exactly
//! as live collaborator data would.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::{flags_from_documents, stops_from_documents};
use crate::anchor::{AnchorPoller, DayAnchorTracker};
use crate::clock::{ManualClock, SimulationClock};
use crate::config::Config;
use crate::jump::JumpReport;
use crate::model::{EventKey, FlagRecord, TimelineEvent};
use crate::reconciler::{Reconciler, StopLoad};
use crate::sidebar::{Sidebar, SidebarMessage, SidebarRow};
use crate::watch::{Bus, Watch};

/// Errors that can occur while loading or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no timeline entry {0}")]
    UnknownEvent(String),

    #[error("{0} has no instant to jump to")]
    NotJumpable(EventKey),

    #[error("the simulation clock has no window loaded")]
    NoClockWindow,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, SessionError>;

/// The on-disk form of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub clock: ManualClock,

    #[serde(default)]
    pub flags: Vec<Value>,

    /// `None` while the stop load has not completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<Value>>,
}

impl SessionSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn stop_load(&self) -> StopLoad {
        match &self.stops {
            Some(docs) => StopLoad::Loaded(stops_from_documents(docs)),
            None => StopLoad::Pending,
        }
    }
}

/// A snapshot wired up the way a live viewer wires the sidebar: source
/// watches, anchor tracker, reconciler and sidebar over one clock.
pub struct Session {
    clock: ManualClock,
    poller: AnchorPoller,
    sidebar: Sidebar,
    reconciler: Reconciler,
    _flags: Watch<Vec<FlagRecord>>,
    _stops: Watch<StopLoad>,
}

impl Session {
    pub fn open(snapshot: &SessionSnapshot, config: &Config) -> Self {
        let flags = Watch::new(flags_from_documents(&snapshot.flags));
        let stops = Watch::new(snapshot.stop_load());
        let anchor = DayAnchorTracker::new();
        anchor.sync(&snapshot.clock);

        let reconciler = Reconciler::attach(&flags, &stops, &anchor, config.fallback_step_seconds);
        let sidebar = Sidebar::new(
            &reconciler,
            Bus::<SidebarMessage>::new(),
            config.flash_duration(),
        );

        Self {
            clock: snapshot.clock.clone(),
            poller: AnchorPoller::new(anchor, config.anchor_poll_interval()),
            sidebar,
            reconciler,
            _flags: flags,
            _stops: stops,
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Load a new clock window, as the viewer does when another run is
    /// opened. The timeline follows on the next anchor poll.
    pub fn load_window(&mut self, start: Timestamp, stop: Timestamp) {
        self.clock.load_window(start, stop);
    }

    /// Re-read the clock's start day if the poll interval has elapsed.
    /// Returns whether the anchor moved.
    pub fn poll_anchor(&mut self, now: Timestamp) -> bool {
        self.poller.tick(now, &self.clock)
    }

    pub fn events(&self) -> Vec<TimelineEvent> {
        self.reconciler.events()
    }

    pub fn rows(&self, now: Timestamp) -> Vec<SidebarRow> {
        self.sidebar.rows(now)
    }

    /// Jump to the entry at `index` in timeline order.
    pub fn jump_to_index(&mut self, index: usize, now: Timestamp) -> Result<JumpReport> {
        self.poll_anchor(now);
        let event = self
            .events()
            .get(index)
            .cloned()
            .ok_or_else(|| SessionError::UnknownEvent(format!("#{index}")))?;
        self.check_jumpable(&event)?;
        self.sidebar
            .select(index, now, &mut self.clock)
            .ok_or(SessionError::NoClockWindow)
    }

    /// Jump to the entry with `key`.
    pub fn jump_to_key(&mut self, key: &EventKey, now: Timestamp) -> Result<JumpReport> {
        self.poll_anchor(now);
        let event = self
            .events()
            .into_iter()
            .find(|e| &e.key() == key)
            .ok_or_else(|| SessionError::UnknownEvent(key.to_string()))?;
        self.check_jumpable(&event)?;
        self.sidebar
            .select_key(key, now, &mut self.clock)
            .ok_or(SessionError::NoClockWindow)
    }

    /// The snapshot with this session's clock state.
    pub fn snapshot(&self, original: &SessionSnapshot) -> SessionSnapshot {
        SessionSnapshot {
            clock: self.clock.clone(),
            ..original.clone()
        }
    }

    fn check_jumpable(&self, event: &TimelineEvent) -> Result<()> {
        if self.clock.start_time().is_none() || self.clock.stop_time().is_none() {
            return Err(SessionError::NoClockWindow);
        }
        if !event.is_jumpable() {
            return Err(SessionError::NotJumpable(event.key()));
        }
        Ok(())
    }
}
