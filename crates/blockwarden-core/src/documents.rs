//! Document tracking
//!
//! The engine keeps one [`DocumentState`] per open document, keyed by the
//! host's handle. Each set also keeps an ordered list of the open documents
//! matching it, most recently focused first, so time spent with several
//! matching pages open is only counted once.

use blockwarden_api::TimeLeft;
use blockwarden_util::{DocHandle, SetId};

use crate::lockdown::DelayCountdown;

/// Engine-owned state of one open document
#[derive(Debug, Clone)]
pub struct DocumentState {
    pub handle: DocHandle,
    /// Address last loaded, as used for matching
    pub page: Option<String>,
    /// Loaded as an embedded frame
    pub embedded: bool,
    pub open_since: Option<i64>,
    pub focus_since: Option<i64>,
    /// When the re-check timer fires
    pub recheck_at: Option<i64>,
    pub countdown: Option<DelayCountdown>,
    /// Result of the last evaluation and when it was made
    pub time_left: TimeLeft,
    pub time_left_at: i64,
}

impl DocumentState {
    pub fn new(handle: DocHandle, embedded: bool, now: i64) -> Self {
        Self {
            handle,
            page: None,
            embedded,
            open_since: Some(now),
            focus_since: None,
            recheck_at: None,
            countdown: None,
            time_left: TimeLeft::UNLIMITED,
            time_left_at: now,
        }
    }

    pub fn has_focus(&self) -> bool {
        self.focus_since.is_some()
    }

    pub fn start_focus(&mut self, now: i64) {
        self.focus_since = Some(now);
    }

    /// Stop the focus clock and return the focused seconds
    pub fn stop_focus(&mut self, now: i64) -> i64 {
        elapsed(self.focus_since.take(), now)
    }

    /// Seconds open and focused since the last call; running clocks restart at `now`
    pub fn clock(&mut self, now: i64) -> (i64, i64) {
        let open = elapsed(self.open_since, now);
        let focus = elapsed(self.focus_since, now);
        if self.open_since.is_some() {
            self.open_since = Some(now);
        }
        if self.focus_since.is_some() {
            self.focus_since = Some(now);
        }
        (open, focus)
    }

    /// Stop both clocks for good
    pub fn stop(&mut self, now: i64) -> (i64, i64) {
        (elapsed(self.open_since.take(), now), elapsed(self.focus_since.take(), now))
    }

    /// Time left from the last evaluation, counted down to `now`
    pub fn time_left_at(&self, now: i64) -> TimeLeft {
        TimeLeft {
            seconds: self
                .time_left
                .seconds
                .map(|s| (s - (now - self.time_left_at).max(0)).max(0)),
            set: self.time_left.set,
        }
    }
}

fn elapsed(since: Option<i64>, now: i64) -> i64 {
    since.map(|t| (now - t).max(0)).unwrap_or(0)
}

/// Per-set ordered lists of open matching documents
#[derive(Debug, Default)]
pub struct ActiveDocuments {
    lists: [Vec<DocHandle>; SetId::COUNT],
}

impl ActiveDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add at the front unless already listed
    pub fn add(&mut self, set: SetId, doc: DocHandle) {
        let list = &mut self.lists[set.index()];
        if !list.contains(&doc) {
            list.insert(0, doc);
        }
    }

    /// Remove from every set
    pub fn remove(&mut self, doc: DocHandle) {
        for list in &mut self.lists {
            list.retain(|d| *d != doc);
        }
    }

    /// Move to the front of every set that lists it
    pub fn set_active(&mut self, doc: DocHandle) {
        for list in &mut self.lists {
            if let Some(pos) = list.iter().position(|d| *d == doc) {
                list.remove(pos);
                list.insert(0, doc);
            }
        }
    }

    pub fn is_active(&self, set: SetId, doc: DocHandle) -> bool {
        self.lists[set.index()].first() == Some(&doc)
    }

    pub fn len(&self, set: SetId) -> usize {
        self.lists[set.index()].len()
    }
}
