//! Errors from engine operations outside page evaluation

use blockwarden_config::ConfigError;
use blockwarden_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("A lockdown is already active until {}", display_instant(.until))]
    LockdownActive { until: i64 },

    #[error("Invalid lockdown duration: {0} seconds")]
    InvalidDuration(i64),

    #[error("No block sets selected")]
    NoSetsSelected,

    #[error("Invalid site pattern: {0:?}")]
    InvalidPattern(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn display_instant(instant: &i64) -> String {
    blockwarden_util::format_instant(*instant)
}

pub type EngineResult<T> = Result<T, EngineError>;
