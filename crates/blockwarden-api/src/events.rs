//! Event types for engine -> host notification

use blockwarden_util::{DocHandle, SetId};
use serde::{Deserialize, Serialize};

use crate::API_VERSION;

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    /// Epoch seconds at which the engine produced the event
    pub timestamp: i64,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(timestamp: i64, payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp,
            payload,
        }
    }
}

/// Everything the engine tells its host about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Seconds left dropped to or below the warning threshold
    WarningIssued { set: SetId, seconds_left: i64 },

    /// A document was sent to a block or delaying page
    Redirected {
        doc: DocHandle,
        set: SetId,
        target_url: String,
    },

    /// Delay countdown advanced by one second
    CountdownTick {
        doc: DocHandle,
        set: SetId,
        remaining: i64,
    },

    /// Delay countdown finished and the blocked address was allowed
    OverrideGranted {
        doc: DocHandle,
        set: SetId,
        url: String,
    },

    LockdownStarted { sets: Vec<SetId>, until: i64 },

    LockdownCancelled { set: SetId },

    UsageRestarted { set: SetId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization() {
        let event = Event::new(
            1_700_000_000,
            EventPayload::Redirected {
                doc: DocHandle::new(7),
                set: SetId::new(1).unwrap(),
                target_url: "blockwarden://blocked?1&http://example.com/".into(),
            },
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"redirected\""));
        let parsed: Event = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.api_version, API_VERSION);
        assert_eq!(parsed.payload, event.payload);
    }
}
