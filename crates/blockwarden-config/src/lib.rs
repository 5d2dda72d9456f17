//! Block set settings for blockwarden
//!
//! Settings live in the preference store as flat keys (see [`keys`]).
//! This crate provides:
//! - Typed views over those keys ([`BlockSetConfig`], [`GlobalOptions`])
//! - A versioned TOML policy format that can be applied to a store
//! - Format validation with clear error messages

pub mod keys;
mod policy;
mod schema;
mod sets;
mod validation;

pub use policy::*;
pub use schema::*;
pub use sets::*;
pub use validation::*;

use blockwarden_store::StoreError;
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load and validate a policy from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate a policy from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;
