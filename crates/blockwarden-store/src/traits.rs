//! Store trait definitions

use crate::{StoreError, StoreResult};

/// Durable key-value preferences.
///
/// Values are stored as strings; the typed accessors parse on read and
/// report a [`StoreError::BadValue`] when the stored text does not fit.
pub trait PrefStore: Send + Sync {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key so that readers fall back to defaults
    fn clear(&self, key: &str) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;

    fn get_int(&self, key: &str) -> StoreResult<Option<i64>> {
        match self.get_string(key)? {
            None => Ok(None),
            Some(v) => v
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| StoreError::BadValue {
                    key: key.to_string(),
                    value: v,
                }),
        }
    }

    fn set_int(&self, key: &str, value: i64) -> StoreResult<()> {
        self.set_string(key, &value.to_string())
    }

    fn get_bool(&self, key: &str) -> StoreResult<Option<bool>> {
        match self.get_string(key)?.as_deref() {
            None => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(StoreError::BadValue {
                key: key.to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> StoreResult<()> {
        self.set_string(key, if value { "true" } else { "false" })
    }
}
