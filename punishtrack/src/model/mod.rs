//! Data model
//!
//! Frame snapshots flow in, conversion records flow out. Contest settings
//! describe the roster and double as the metadata attached to every
//! published record.

pub mod contest;
pub mod conversion;
pub mod frame;

pub use contest::{ContestSettings, Participant, ParticipantPair};
pub use conversion::{ConversionRecord, MoveEvent, OpeningType, PunishKind};
pub use frame::{FramePair, FrameSnapshot, Percent, PlayerFrame};
