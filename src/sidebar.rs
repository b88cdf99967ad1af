//! Sidebar state: selection, flash highlighting, and click-to-jump.
//!
//! The sidebar talks to the rest of the viewer over a [`Bus`] of
//! [`SidebarMessage`]s. Any component may ask for an entry to be flashed;
//! the sidebar announces every jump it performs.

use std::{cell::RefCell, rc::Rc};

use jiff::{SignedDuration, Timestamp};

use crate::clock::SimulationClock;
use crate::jump::{JumpReport, JumpResolver};
use crate::model::{EventKey, TimelineEvent};
use crate::reconciler::Reconciler;
use crate::watch::{Bus, Subscription, Watch};

/// Messages exchanged between the sidebar and its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarMessage {
    /// Highlight an entry briefly, starting at `at`.
    Flash { key: EventKey, at: Timestamp },

    /// The sidebar moved the clock.
    Jumped(JumpReport),
}

/// An entry highlighted until `until`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub key: EventKey,
    pub until: Timestamp,
}

/// One rendered line of the sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarRow {
    pub event: TimelineEvent,
    pub active: bool,
    pub flashing: bool,
    pub clickable: bool,
}

#[derive(Default)]
struct SidebarState {
    active: Option<EventKey>,
    flash: Option<Flash>,
    disabled: bool,
}

pub struct Sidebar {
    timeline: Watch<Vec<TimelineEvent>>,
    bus: Bus<SidebarMessage>,
    state: Rc<RefCell<SidebarState>>,
    resolver: JumpResolver,
    _flash_subscription: Subscription,
}

impl Sidebar {
    pub fn new(
        reconciler: &Reconciler,
        bus: Bus<SidebarMessage>,
        flash_duration: SignedDuration,
    ) -> Self {
        let state = Rc::new(RefCell::new(SidebarState::default()));
        let flash_state = Rc::clone(&state);
        let flash_subscription = bus.subscribe(move |message| {
            if let SidebarMessage::Flash { key, at } = message {
                flash_state.borrow_mut().flash = Some(Flash {
                    key: key.clone(),
                    until: at.checked_add(flash_duration).unwrap_or(Timestamp::MAX),
                });
            }
        });

        Self {
            timeline: reconciler.timeline(),
            bus,
            state,
            resolver: JumpResolver::new(),
            _flash_subscription: flash_subscription,
        }
    }

    /// A disabled sidebar lists entries but ignores clicks.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.borrow_mut().disabled = disabled;
    }

    pub fn is_disabled(&self) -> bool {
        self.state.borrow().disabled
    }

    pub fn active(&self) -> Option<EventKey> {
        self.state.borrow().active.clone()
    }

    /// The entry flashing at `now`, if any.
    pub fn flashing(&self, now: Timestamp) -> Option<EventKey> {
        let state = self.state.borrow();
        state
            .flash
            .as_ref()
            .filter(|f| now < f.until)
            .map(|f| f.key.clone())
    }

    /// The current timeline with per-row highlight state.
    pub fn rows(&self, now: Timestamp) -> Vec<SidebarRow> {
        let active = self.active();
        let flashing = self.flashing(now);
        let disabled = self.is_disabled();
        self.timeline.with(|events| {
            events
                .iter()
                .map(|event| {
                    let key = event.key();
                    SidebarRow {
                        active: active.as_ref() == Some(&key),
                        flashing: flashing.as_ref() == Some(&key),
                        clickable: !disabled && event.is_jumpable(),
                        event: event.clone(),
                    }
                })
                .collect()
        })
    }

    /// Click the entry at `index`: jump the clock, then activate and flash it.
    ///
    /// Ignored while disabled, for out-of-range indices, for entries that
    /// have no instant to jump to, and while the clock has no window.
    pub fn select(
        &mut self,
        index: usize,
        now: Timestamp,
        clock: &mut impl SimulationClock,
    ) -> Option<JumpReport> {
        let event = self.timeline.with(|events| events.get(index).cloned())?;
        self.click(&event, now, clock)
    }

    /// Click the entry with `key`. Keys survive timeline rebuilds; indices
    /// do not.
    pub fn select_key(
        &mut self,
        key: &EventKey,
        now: Timestamp,
        clock: &mut impl SimulationClock,
    ) -> Option<JumpReport> {
        let event = self
            .timeline
            .with(|events| events.iter().find(|e| &e.key() == key).cloned())?;
        self.click(&event, now, clock)
    }

    pub fn resolver(&self) -> &JumpResolver {
        &self.resolver
    }

    fn click(
        &mut self,
        event: &TimelineEvent,
        now: Timestamp,
        clock: &mut impl SimulationClock,
    ) -> Option<JumpReport> {
        if self.is_disabled() || !event.is_jumpable() {
            return None;
        }
        let report = self.resolver.resolve_and_jump(event, clock)?;
        let key = event.key();
        self.state.borrow_mut().active = Some(key.clone());
        self.bus.publish(SidebarMessage::Flash { key, at: now });
        self.bus.publish(SidebarMessage::Jumped(report.clone()));
        Some(report)
    }
}
