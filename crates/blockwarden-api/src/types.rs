//! Shared types for the blockwarden API

use blockwarden_util::SetId;
use serde::{Deserialize, Serialize};

/// How schedule membership and quota exhaustion combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMode {
    /// Either condition blocks
    #[default]
    Or,
    /// Both conditions must hold
    And,
}

/// Seconds until the next state change, and the set that limits it.
///
/// `seconds == None` means no set will start blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLeft {
    pub seconds: Option<i64>,
    pub set: Option<SetId>,
}

impl TimeLeft {
    pub const UNLIMITED: TimeLeft = TimeLeft {
        seconds: None,
        set: None,
    };

    /// Keep the smaller countdown; ties keep the earlier set.
    pub fn min_with(self, seconds: Option<i64>, set: SetId) -> TimeLeft {
        match (self.seconds, seconds) {
            (_, None) => self,
            (None, Some(s)) => TimeLeft {
                seconds: Some(s),
                set: Some(set),
            },
            (Some(cur), Some(s)) if s < cur => TimeLeft {
                seconds: Some(s),
                set: Some(set),
            },
            _ => self,
        }
    }
}

/// Outcome of evaluating a page address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allow {
        time_left: TimeLeft,
    },
    Block {
        set: SetId,
        /// Templated block page address
        target_url: String,
        blocked_url: String,
    },
    /// Block through the delaying page; access is granted after the countdown
    Delay {
        set: SetId,
        target_url: String,
        blocked_url: String,
        delay_secs: i64,
    },
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }

    pub fn blocking_set(&self) -> Option<SetId> {
        match self {
            Verdict::Allow { .. } => None,
            Verdict::Block { set, .. } | Verdict::Delay { set, .. } => Some(*set),
        }
    }

    pub fn target_url(&self) -> Option<&str> {
        match self {
            Verdict::Allow { .. } => None,
            Verdict::Block { target_url, .. } | Verdict::Delay { target_url, .. } => {
                Some(target_url)
            }
        }
    }
}

/// Usage statistics for one block set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStats {
    pub set: SetId,
    /// Start of data gathering (epoch seconds)
    pub started_at: i64,
    pub total_secs: i64,
    pub avg_secs_per_day: f64,
    /// Quota time left in the current period; `None` without a quota
    pub quota_left_secs: Option<i64>,
}

/// Status of one block set at a given instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStatus {
    pub set: SetId,
    pub name: String,
    pub mode: BlockMode,
    /// Lockdown deadline if a lockdown is active
    pub lockdown_until: Option<i64>,
    /// Whether block conditions currently hold (keywords ignored)
    pub blocking: bool,
    pub unblock_at: Option<i64>,
    pub stats: SetStats,
}

/// Snapshot of every block set, for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub api_version: u32,
    pub now: i64,
    pub sets: Vec<SetStatus>,
    /// Sets currently preventing access to the options
    pub settings_locked_by: Vec<SetId>,
}
