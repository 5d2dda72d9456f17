//! Persistence layer for blockwarden
//!
//! Provides:
//! - Durable string/int/bool preferences keyed by name
//! - SQLite-backed implementation
//! - Typed per-set usage records over their comma-joined wire format

mod sqlite;
mod traits;
mod usage;

pub use sqlite::*;
pub use traits::*;
pub use usage::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Preference {key} has unexpected value {value:?}")]
    BadValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
