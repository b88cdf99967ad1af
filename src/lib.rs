//! trackline: a day-agnostic event timeline for simulation playback.
//!
//! Operator flags (absolute instants) and CSV stops (times of day only) are
//! merged into one order by time of day on the simulation's reference day,
//! and kept in sync as flags, stops, or the reference day change.

pub mod adapter;
pub mod anchor;
pub mod clock;
pub mod config;
pub mod extract;
pub mod jump;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod reconciler;
pub mod session;
pub mod sidebar;
pub mod watch;
