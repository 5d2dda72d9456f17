//! In-memory host implementations for testing

use blockwarden_util::DocHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::{BrowserHost, Clock, HostError, HostResult};

/// Clock pinned to a settable instant and a fixed UTC offset
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
    offset_minutes: AtomicI32,
}

impl FixedClock {
    pub fn new(now: i64, offset_minutes: i32) -> Self {
        Self {
            now: AtomicI64::new(now),
            offset_minutes: AtomicI32::new(offset_minutes),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) -> i64 {
        self.now.fetch_add(secs, Ordering::SeqCst) + secs
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn utc_offset_minutes(&self, _instant: i64) -> i32 {
        self.offset_minutes.load(Ordering::SeqCst)
    }
}

/// Mock document state
#[derive(Debug, Clone, Default)]
pub struct MockDocument {
    pub url: String,
    /// `None` simulates text that cannot be read
    pub text: Option<Vec<String>>,
}

/// Mock browser host for unit/integration testing
#[derive(Debug, Default)]
pub struct MockBrowser {
    docs: Mutex<HashMap<DocHandle, MockDocument>>,
    navigations: Mutex<Vec<(DocHandle, String)>>,

    /// Configure navigation to fail
    pub fail_navigate: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, doc: DocHandle, url: &str) {
        lock(&self.docs).insert(
            doc,
            MockDocument {
                url: url.to_string(),
                text: Some(Vec::new()),
            },
        );
    }

    pub fn set_text(&self, doc: DocHandle, text: &[&str]) {
        if let Some(d) = lock(&self.docs).get_mut(&doc) {
            d.text = Some(text.iter().map(|s| s.to_string()).collect());
        }
    }

    pub fn make_text_unavailable(&self, doc: DocHandle) {
        if let Some(d) = lock(&self.docs).get_mut(&doc) {
            d.text = None;
        }
    }

    pub fn close(&self, doc: DocHandle) {
        lock(&self.docs).remove(&doc);
    }

    /// All navigations requested so far, in order
    pub fn navigations(&self) -> Vec<(DocHandle, String)> {
        lock(&self.navigations).clone()
    }

    pub fn last_navigation(&self, doc: DocHandle) -> Option<String> {
        lock(&self.navigations)
            .iter()
            .rev()
            .find(|(d, _)| *d == doc)
            .map(|(_, url)| url.clone())
    }
}

impl BrowserHost for MockBrowser {
    fn document_text(&self, doc: DocHandle) -> HostResult<Vec<String>> {
        match lock(&self.docs).get(&doc) {
            Some(MockDocument { text: Some(t), .. }) => Ok(t.clone()),
            Some(_) => Err(HostError::TextUnavailable(format!("{doc}"))),
            None => Err(HostError::DocumentGone(doc)),
        }
    }

    fn current_url(&self, doc: DocHandle) -> Option<String> {
        lock(&self.docs).get(&doc).map(|d| d.url.clone())
    }

    fn navigate_to(&self, doc: DocHandle, url: &str) -> HostResult<()> {
        if self.fail_navigate.load(Ordering::SeqCst) {
            return Err(HostError::NavigationFailed(url.to_string()));
        }

        let mut docs = lock(&self.docs);
        let d = docs.get_mut(&doc).ok_or(HostError::DocumentGone(doc))?;
        d.url = url.to_string();
        // A new page replaces the old text
        d.text = Some(Vec::new());
        drop(docs);

        tracing::debug!(doc = %doc, url = %url, "Mock navigation");
        lock(&self.navigations).push((doc, url.to_string()));
        Ok(())
    }
}
