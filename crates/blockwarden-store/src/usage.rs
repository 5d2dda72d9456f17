//! Per-set usage records
//!
//! Each block set keeps one record under `timedata{N}`, stored as
//! `periodAnchor,totalSeconds,windowAnchor,windowSeconds,lockdownUntil`.
//! The record is decoded as soon as it leaves the store; nothing else sees
//! the joined string.

use blockwarden_util::SetId;
use tracing::debug;

use crate::{PrefStore, StoreResult};

/// Typed usage record for one block set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    /// Instant the lifetime counter started
    pub period_anchor: i64,
    /// Lifetime accumulated seconds
    pub total_seconds: i64,
    /// Start of the quota period being counted, 0 if none
    pub window_anchor: i64,
    /// Seconds accumulated within that quota period
    pub window_seconds: i64,
    /// Lockdown deadline, 0 if none
    pub lockdown_until: i64,
}

impl UsageRecord {
    pub fn fresh(now: i64) -> Self {
        Self {
            period_anchor: now,
            total_seconds: 0,
            window_anchor: 0,
            window_seconds: 0,
            lockdown_until: 0,
        }
    }

    /// Decode the wire format.
    ///
    /// Four fields (the format before lockdown existed) are accepted with no
    /// lockdown. Any other field count or a non-integer field yields a fresh
    /// record anchored at `now`.
    pub fn decode(raw: &str, now: i64) -> Self {
        let fields: Option<Vec<i64>> = raw
            .split(',')
            .map(|f| f.trim().parse::<i64>().ok())
            .collect();

        match fields.as_deref() {
            Some(&[pa, ts, wa, ws]) => Self {
                period_anchor: pa,
                total_seconds: ts,
                window_anchor: wa,
                window_seconds: ws,
                lockdown_until: 0,
            },
            Some(&[pa, ts, wa, ws, lu]) => Self {
                period_anchor: pa,
                total_seconds: ts,
                window_anchor: wa,
                window_seconds: ws,
                lockdown_until: lu,
            },
            _ => {
                debug!(raw = %raw, "Discarding malformed usage record");
                Self::fresh(now)
            }
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.period_anchor,
            self.total_seconds,
            self.window_anchor,
            self.window_seconds,
            self.lockdown_until
        )
    }

    pub fn in_lockdown(&self, now: i64) -> bool {
        self.lockdown_until > now
    }
}

/// Preference key holding the usage record of a set
pub fn usage_key(set: SetId) -> String {
    format!("timedata{set}")
}

/// Read the usage record of a set; a missing or malformed value is fresh
pub fn load_usage(prefs: &dyn PrefStore, set: SetId, now: i64) -> StoreResult<UsageRecord> {
    Ok(match prefs.get_string(&usage_key(set))? {
        Some(raw) => UsageRecord::decode(&raw, now),
        None => UsageRecord::fresh(now),
    })
}

pub fn save_usage(prefs: &dyn PrefStore, set: SetId, record: &UsageRecord) -> StoreResult<()> {
    prefs.set_string(&usage_key(set), &record.encode())
}
