//! In-process browser host for the command line
//!
//! Pages are simulated: the address and text come from the command line and
//! navigation only records the new address.

use blockwarden_host_api::{BrowserHost, HostError, HostResult};
use blockwarden_util::DocHandle;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

#[derive(Debug, Clone)]
struct Page {
    url: String,
    text: Vec<String>,
}

#[derive(Debug, Default)]
pub struct PageHost {
    pages: Mutex<HashMap<DocHandle, Page>>,
}

impl PageHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn pages(&self) -> MutexGuard<'_, HashMap<DocHandle, Page>> {
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self, doc: DocHandle, url: &str, text: Vec<String>) {
        self.pages().insert(
            doc,
            Page {
                url: url.to_string(),
                text,
            },
        );
    }

    pub fn url(&self, doc: DocHandle) -> Option<String> {
        self.pages().get(&doc).map(|p| p.url.clone())
    }
}

impl BrowserHost for PageHost {
    fn document_text(&self, doc: DocHandle) -> HostResult<Vec<String>> {
        self.pages()
            .get(&doc)
            .map(|p| p.text.clone())
            .ok_or(HostError::DocumentGone(doc))
    }

    fn current_url(&self, doc: DocHandle) -> Option<String> {
        self.url(doc)
    }

    fn navigate_to(&self, doc: DocHandle, url: &str) -> HostResult<()> {
        let mut pages = self.pages();
        let page = pages.get_mut(&doc).ok_or(HostError::DocumentGone(doc))?;
        page.url = url.to_string();
        page.text.clear();
        info!(doc = %doc, url = %url, "Navigated");
        Ok(())
    }
}
