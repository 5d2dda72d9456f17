//! Block rule evaluation engine for blockwarden
//!
//! This crate holds the decision logic:
//! - Site list compilation (globs, exceptions, keywords)
//! - Schedules and quota periods
//! - The usage ledger, serialized per block set
//! - Page evaluation, document tracking, re-check timers
//! - Lockdown, access overrides and the delaying page countdown

mod address;
mod documents;
mod engine;
mod error;
mod ledger;
mod lockdown;
mod patterns;
mod rules;
mod windows;

pub use address::*;
pub use documents::*;
pub use engine::*;
pub use error::*;
pub use ledger::*;
pub use lockdown::*;
pub use patterns::*;
pub use rules::*;
pub use windows::*;
