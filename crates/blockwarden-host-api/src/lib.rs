//! Host collaborator interfaces for blockwarden
//!
//! This crate defines what the engine consumes from its host: access to open
//! documents (text, current address, navigation) and a wall clock. It contains
//! no browser code itself; `mock` provides in-memory implementations for tests.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
