//! Shared utilities for blockwarden
//!
//! This crate provides:
//! - ID types (SetId, DocHandle)
//! - Time utilities (mock-able wall clock, local time breakdown, day masks,
//!   minute periods)
//! - Error types
//! - Default paths for data and config files

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
