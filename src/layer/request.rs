//! Extraction request and response types

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::TextContent;

/// Unique identifier for extraction requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Shared cancellation flag between a running task and the worker serving it
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Request sent to extraction workers
#[derive(Debug)]
pub enum ExtractRequest<P> {
    /// Extract the text content of a page
    Text {
        id: RequestId,
        page: Arc<P>,
        cancel: CancelFlag,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from text extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractFault {
    #[error("PDF engine: {0}")]
    Pdf(String),

    #[error("page {page} is out of range ({page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl ExtractFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from extraction workers
#[derive(Debug)]
pub enum ExtractResponse {
    /// Extracted text content
    Text { id: RequestId, content: TextContent },

    /// Error during extraction
    Error { id: RequestId, error: ExtractFault },
}

impl ExtractResponse {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Text { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let worker_side = flag.clone();
        assert!(!worker_side.is_cancelled());

        flag.cancel();
        assert!(worker_side.is_cancelled());
    }

    #[test]
    fn response_id_covers_both_outcomes() {
        let ok = ExtractResponse::Text {
            id: RequestId::new(3),
            content: TextContent::default(),
        };
        let err = ExtractResponse::Error {
            id: RequestId::new(4),
            error: ExtractFault::generic("boom"),
        };

        assert_eq!(ok.id(), RequestId::new(3));
        assert_eq!(err.id(), RequestId::new(4));
        assert_eq!(
            ExtractFault::PageOutOfRange {
                page: 7,
                page_count: 3
            }
            .to_string(),
            "page 7 is out of range (3 pages)"
        );
    }
}
