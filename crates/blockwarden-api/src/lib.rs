//! Shared types for blockwarden
//!
//! This crate defines the values that cross the engine boundary:
//! - Verdicts and time-left countdowns
//! - Per-set statistics and status snapshots
//! - Events (engine -> host)
//! - Versioning

mod events;
mod types;

pub use events::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
