//! Error types for blockwarden

use thiserror::Error;

/// Core error type for blockwarden operations
#[derive(Debug, Error)]
pub enum BlockwardenError {
    #[error("Block set out of range: {0} (expected 1-6)")]
    InvalidSetId(i64),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl BlockwardenError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BlockwardenError>;
