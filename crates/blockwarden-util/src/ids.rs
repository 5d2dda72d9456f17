//! Strongly-typed identifiers for blockwarden

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::BlockwardenError;

/// Identifier of one of the six fixed block sets (1..=6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SetId(u8);

impl SetId {
    /// Number of block sets
    pub const COUNT: usize = 6;

    pub fn new(id: u8) -> Option<Self> {
        if (1..=Self::COUNT as u8).contains(&id) {
            Some(Self(id))
        } else {
            None
        }
    }

    /// All set IDs in evaluation order
    pub fn all() -> impl Iterator<Item = SetId> {
        (1..=Self::COUNT as u8).map(SetId)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Zero-based index for fixed-size per-set arrays
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }

    /// Bit for this set in bitmask preferences (`1 << (id - 1)`)
    pub fn bit(&self) -> i64 {
        1 << (self.0 - 1)
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for SetId {
    type Error = BlockwardenError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        SetId::new(id).ok_or(BlockwardenError::InvalidSetId(id as i64))
    }
}

impl From<SetId> for u8 {
    fn from(id: SetId) -> Self {
        id.0
    }
}

impl FromStr for SetId {
    type Err = BlockwardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: i64 = s
            .trim()
            .parse()
            .map_err(|_| BlockwardenError::parse(format!("not a block set number: {s}")))?;
        u8::try_from(n)
            .ok()
            .and_then(SetId::new)
            .ok_or(BlockwardenError::InvalidSetId(n))
    }
}

/// Opaque handle for a host document (tab, frame, page instance).
///
/// Supplied by the host; the engine only uses it as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocHandle(u64);

impl DocHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}
