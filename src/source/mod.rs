//! Single-source paginator
//!
//! Wraps one upstream query function behind a cached, cursor-addressed
//! buffer. The idea: keep a persisted list of hits loaded so far, and let
//! the cursor be a position in that list. Every `load` first extracts hits
//! from the cached list and, only when not enough are there, issues exactly
//! one upstream fetch to append more. Returned hits are excluded against
//! everything before the cursor position, so a hit is never repeated.

mod slot;

pub use slot::SourceSlot;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cursor;
use crate::error::Result;
use crate::hasher::Hasher;
use crate::store::Store;
use crate::types::{Page, PreloadSize};

/// Upstream query function for one source.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Fetch up to `count` hits after `cursor`, excluding `exclude_hits` on
    /// a best-effort basis (e.g. with a `NOT IN (...)` clause). Must return
    /// a `None` cursor exactly when no further results exist upstream.
    async fn fetch(
        &self,
        cursor: Option<&str>,
        exclude_hits: &[T],
        count: usize,
    ) -> Result<Page<T>>;
}

/// A single stream of hits subject for pagination.
pub struct Source<T> {
    name: String,
    page_size: usize,
    preload_size: PreloadSize,
    fetcher: Arc<dyn Fetcher<T>>,
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("page_size", &self.page_size)
            .field("preload_size", &self.preload_size)
            .finish_non_exhaustive()
    }
}

impl<T> Source<T> {
    /// Create a source wrapping `fetcher`, serving pages of `page_size`
    pub fn new(name: impl Into<String>, page_size: usize, fetcher: Arc<dyn Fetcher<T>>) -> Self {
        Self {
            name: name.into(),
            page_size,
            preload_size: PreloadSize::default(),
            fetcher,
        }
    }

    /// Override how many hits an upstream fetch requests
    #[must_use]
    pub fn with_preload_size(mut self, preload_size: PreloadSize) -> Self {
        self.preload_size = preload_size;
        self
    }

    /// Name of this source; used as a mapping key by the merge
    /// orchestrator, so it must be unique within one orchestrator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Page size served by `load`
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl<T> Source<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Load the next page of hits starting at `cursor`.
    ///
    /// Hits whose hash appears in `exclude_hits`, or before the cursor
    /// position in the cached buffer, are skipped. At most one upstream
    /// fetch is issued per call, which bounds cost and keeps latency
    /// predictable; the page may therefore come back shorter than
    /// `page_size` even with a non-`None` cursor. Upstream and store
    /// failures propagate unretried.
    pub async fn load(
        &self,
        store: &dyn Store,
        cursor: Option<&str>,
        exclude_hits: &[T],
        hasher: &dyn Hasher<T>,
    ) -> Result<Page<T>> {
        let (slot_key, mut pos) = cursor::decode(cursor);

        let slot_read = store.read(&slot_key).await?;
        let existed = slot_read.is_some();
        let mut slot: SourceSlot<T> = match slot_read {
            Some(value) => serde_json::from_value(value)?,
            None => SourceSlot::new(),
        };

        // A tampered or stale position may point past the buffer.
        pos = pos.min(slot.hits.len());

        let mut exclude_hashes: HashSet<String> = slot.hits[..pos]
            .iter()
            .chain(exclude_hits.iter())
            .map(|hit| hasher.hash(hit))
            .collect();

        // Extract hits from the cached buffer starting at pos.
        let mut hits = Vec::new();
        pos = extract_hits(
            &mut hits,
            &mut exclude_hashes,
            hasher,
            &slot.hits,
            pos,
            self.page_size,
        );

        // Not enough hits in the cache? Grow it with a single fetch. A
        // never-queried slot always fetches, an upstream known to be
        // exhausted never does.
        if !existed || (slot.cursor.is_some() && hits.len() < self.page_size) {
            let count = self.preload_size.resolve(self.page_size, pos);
            debug!(
                source = %self.name,
                upstream_cursor = ?slot.cursor,
                count,
                "fetching upstream"
            );

            let mut upstream_exclude = slot.hits.clone();
            upstream_exclude.extend_from_slice(exclude_hits);
            let res = self
                .fetcher
                .fetch(slot.cursor.as_deref(), &upstream_exclude, count)
                .await?;

            slot.hits.extend(res.hits);
            slot.cursor = res.cursor;
            slot.updated_at = Utc::now();
            store.write(&slot_key, serde_json::to_value(&slot)?).await?;
        }

        // Second pass over the possibly larger buffer to top up the page.
        pos = extract_hits(
            &mut hits,
            &mut exclude_hashes,
            hasher,
            &slot.hits,
            pos,
            self.page_size,
        );

        let cursor = if pos < slot.hits.len() || slot.cursor.is_some() {
            Some(cursor::encode(&slot_key, pos))
        } else {
            None
        };
        Ok(Page::new(hits, cursor))
    }
}

/// Copy unexcluded hits from `cached[pos..]` into `out` until the page is
/// full or the buffer ends; returns the index of the first unconsumed hit.
fn extract_hits<T: Clone>(
    out: &mut Vec<T>,
    exclude_hashes: &mut HashSet<String>,
    hasher: &dyn Hasher<T>,
    cached: &[T],
    mut pos: usize,
    page_size: usize,
) -> usize {
    while out.len() < page_size && pos < cached.len() {
        let hit = &cached[pos];
        if exclude_hashes.insert(hasher.hash(hit)) {
            out.push(hit.clone());
        }
        pos += 1;
    }
    pos
}
