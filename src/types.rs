//! Common types used throughout magination
//!
//! Shared type definitions used across the source and merge modules.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A chunk of hits and a cursor which allows to fetch more hits.
///
/// If the cursor is `None`, there are no more hits left to fetch. A "hit"
/// is typically some small metadata about a document (an id, a type), not
/// the document body itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The hits of this page, in upstream order.
    pub hits: Vec<T>,
    /// Cursor resuming after this page; `None` at end of stream.
    pub cursor: Option<String>,
    /// Optional upstream timing, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub took: Option<u64>,
}

impl<T> Page<T> {
    /// Create a page from hits and a cursor
    pub fn new(hits: Vec<T>, cursor: Option<String>) -> Self {
        Self {
            hits,
            cursor,
            took: None,
        }
    }

    /// An empty, exhausted page
    pub fn empty() -> Self {
        Self::new(Vec::new(), None)
    }

    /// Attach upstream timing
    #[must_use]
    pub fn with_took(mut self, took_ms: u64) -> Self {
        self.took = Some(took_ms);
        self
    }

    /// Whether no further hits exist after this page
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }
}

/// How many hits to request from upstream when the cached buffer cannot
/// satisfy the requested page.
#[derive(Clone, Default)]
pub enum PreloadSize {
    /// One more than the page size, so "more pages available" is
    /// detectable without a second round trip.
    #[default]
    Auto,
    /// A fixed prefetch count.
    Fixed(usize),
    /// Computed from the current buffer offset, for services wanting
    /// larger prefetch deeper into a stream.
    Computed(Arc<dyn Fn(usize) -> usize + Send + Sync>),
}

impl PreloadSize {
    /// Resolve the prefetch count for the given page size and offset
    pub fn resolve(&self, page_size: usize, offset: usize) -> usize {
        match self {
            Self::Auto => page_size + 1,
            Self::Fixed(count) => *count,
            Self::Computed(f) => f(offset),
        }
    }
}

impl fmt::Debug for PreloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "Auto"),
            Self::Fixed(count) => f.debug_tuple("Fixed").field(count).finish(),
            Self::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_empty() {
        let page: Page<String> = Page::empty();
        assert!(page.hits.is_empty());
        assert!(page.is_exhausted());
        assert!(page.took.is_none());
    }

    #[test]
    fn test_page_with_took() {
        let page = Page::new(vec!["a"], Some("k:1".to_string())).with_took(12);
        assert_eq!(page.took, Some(12));
        assert!(!page.is_exhausted());
    }

    #[test]
    fn test_preload_size_resolve() {
        assert_eq!(PreloadSize::Auto.resolve(10, 0), 11);
        assert_eq!(PreloadSize::Fixed(42).resolve(10, 0), 42);

        let computed = PreloadSize::Computed(Arc::new(|offset| offset * 2 + 5));
        assert_eq!(computed.resolve(10, 0), 5);
        assert_eq!(computed.resolve(10, 50), 105);
    }

    #[test]
    fn test_page_serde_skips_took() {
        let page = Page::new(vec!["a"], None);
        let json = serde_json::to_string(&page).unwrap();
        assert!(!json.contains("took"));
    }
}
