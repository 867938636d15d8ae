//! Punish detection
//!
//! A per-pair state machine that folds consecutive frame pairs into
//! bounded conversion and combo records.
//!
//! # Architecture
//!
//! - [`PlayerConversionState`] - Mutable cursor for one directional pair
//! - [`machine`] - The per-tick transition function and its [`PunishRules`]
//! - [`opening`] - Opening-type resolution across mirrored pairs

pub mod machine;
pub mod opening;
pub mod state;

pub use machine::{PunishRules, StepOutcome, step};
pub use opening::classify_opening;
pub use state::PlayerConversionState;
