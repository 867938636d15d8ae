//! Subscription configuration
//!
//! Loading and validation of the files that tell the composer which events
//! to emit and how to filter them.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
