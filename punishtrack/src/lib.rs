//! `punishtrack` - conversion and combo detection over per-frame game
//! snapshots.
//!
//! Frame pairs flow into a [`tracker::PunishTracker`], which runs one
//! [`punish`] state machine per directional participant pair and publishes
//! start/extend/closed events on a bounded channel. A
//! [`filter::EventComposer`] built from a subscription file filters and tags
//! those events into one ordered output stream.

pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod observability;
pub mod punish;
pub mod sink;
pub mod source;
pub mod tracker;
