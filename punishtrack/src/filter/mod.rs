//! Event filter/composition engine.
//!
//! Turns subscription declarations into tagged output streams over the
//! tracker's raw events.

mod criteria;
mod engine;
mod participant;

pub use criteria::Criteria;
pub use engine::{EventComposer, Subscription, TaggedEvent, TaggedStream};
pub use participant::ParticipantFilter;
