//! Access overrides and the delaying page countdown

use blockwarden_util::SetId;
use tracing::debug;

use crate::address::ParsedUrl;

/// Temporary allow granted when a delay countdown completes.
///
/// Holds at most one origin and one page. Loading any other top-level page
/// forgets them, so an override is used once per visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessOverride {
    origin: Option<String>,
    page: Option<String>,
}

impl AccessOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allows(&self, url: &ParsedUrl) -> bool {
        self.origin.as_deref() == Some(url.origin.as_str())
            || self.page.as_deref() == Some(url.page.as_str())
    }

    pub fn grant_origin(&mut self, origin: &str) {
        self.origin = Some(origin.to_string());
        self.page = None;
    }

    pub fn grant_page(&mut self, page: &str) {
        self.page = Some(page.to_string());
        self.origin = None;
    }

    pub fn clear(&mut self) {
        self.origin = None;
        self.page = None;
    }

    pub fn is_empty(&self) -> bool {
        self.origin.is_none() && self.page.is_none()
    }

    /// Drop the parts that do not match the page being loaded
    pub fn forget_if_different(&mut self, url: &ParsedUrl) {
        if self.origin.as_ref().is_some_and(|o| *o != url.origin) {
            debug!(origin = ?self.origin, "Origin override dropped");
            self.origin = None;
        }
        if self.page.as_ref().is_some_and(|p| *p != url.page) {
            debug!(page = ?self.page, "Page override dropped");
            self.page = None;
        }
    }
}

/// Countdown shown on the delaying page. Advances only while the document
/// has focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayCountdown {
    pub set: SetId,
    pub blocked_url: String,
    pub remaining: i64,
    pub last_tick: i64,
}

impl DelayCountdown {
    pub fn new(set: SetId, blocked_url: &str, delay_secs: i64, now: i64) -> Self {
        Self {
            set,
            blocked_url: blocked_url.to_string(),
            remaining: delay_secs.max(0),
            last_tick: now,
        }
    }

    /// Advance to `now`; time without focus is skipped. Returns whether the
    /// remaining time changed.
    pub fn advance(&mut self, now: i64, focused: bool) -> bool {
        let elapsed = (now - self.last_tick).max(0);
        self.last_tick = self.last_tick.max(now);
        if !focused || elapsed == 0 || self.remaining == 0 {
            return false;
        }
        self.remaining = (self.remaining - elapsed).max(0);
        true
    }

    /// Restart the tick reference, e.g. when focus returns
    pub fn resume(&mut self, now: i64) {
        self.last_tick = now;
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}
