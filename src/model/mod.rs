//! Core data model for trackline.
//!
//! Records come in from the collaborators (flags, stops), and the
//! reconciler derives timeline events from them against a day anchor.

mod event;
mod record;
mod time;

pub use event::{EventKey, EventSource, ParseEventKeyError, Placement, TimelineEvent};
pub use record::{FlagRecord, GeoPoint, StopRecord, TimeSources};
pub use time::{DayAnchor, TimeOfDay};
