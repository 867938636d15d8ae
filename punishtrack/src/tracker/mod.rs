//! Conversion/combo stream adapter.
//!
//! Turns a stream of rosters and frame pairs into [`RawEvent`]s on a
//! bounded channel.

mod adapter;
mod events;

pub use adapter::{
    DEFAULT_CHANNEL_CAPACITY, PunishTracker, RunSummary, TRACKED_PARTICIPANTS, TrackedPair,
    TrackerConfig, TrackerInput,
};
pub use events::{EventKind, RawEvent};
