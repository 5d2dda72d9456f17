//! Host collaborator traits

use blockwarden_util::DocHandle;
use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Document not found: {0}")]
    DocumentGone(DocHandle),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Document text unavailable: {0}")]
    TextUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Access to the host's open documents
pub trait BrowserHost: Send + Sync {
    /// All text content of the loaded document, for keyword matching
    fn document_text(&self, doc: DocHandle) -> HostResult<Vec<String>>;

    /// Current address of the document, or `None` if it no longer exists
    fn current_url(&self, doc: DocHandle) -> Option<String>;

    fn navigate_to(&self, doc: DocHandle, url: &str) -> HostResult<()>;
}

/// Wall clock consumed by the engine
pub trait Clock: Send + Sync {
    /// Seconds since the epoch
    fn now(&self) -> i64;

    /// Local offset from UTC at `instant`, in minutes (east positive)
    fn utc_offset_minutes(&self, instant: i64) -> i32;
}

/// The system clock, honouring mock time in debug builds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        blockwarden_util::unix_now()
    }

    fn utc_offset_minutes(&self, instant: i64) -> i32 {
        blockwarden_util::local_offset_secs(instant) / 60
    }
}
