//! Multi-source merge orchestrator
//!
//! Unions multiple pagination sources into one continuous page stream
//! with a single cursor. Each `load` call runs exactly one round: every
//! still-active source is started concurrently, the results are drained in
//! configured priority order, and merge state is persisted after each
//! source's contribution so an interrupted round loses no progress.

mod slot;

pub use slot::{CursorEntry, CursorSet, Frame, MergeSlot};

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::FuturesOrdered;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cursor;
use crate::error::{Error, Result};
use crate::hasher::Hasher;
use crate::source::Source;
use crate::store::Store;

/// A page emitted by the merge stream.
#[derive(Debug, Clone)]
pub struct MergedPage<T> {
    /// Deduplicated hits contributed by `source` in this step
    pub hits: Vec<T>,
    /// Cursor resuming after this page; `None` at end of stream
    pub cursor: Option<String>,
    /// Cursor two steps back, for "previous page" style navigation
    pub prev_cursor: Option<String>,
    /// The source which produced the hits
    pub source: Arc<Source<T>>,
}

/// Boxed stream of merged pages.
pub type PageStream<T> = Pin<Box<dyn Stream<Item = Result<MergedPage<T>>> + Send>>;

/// A union of multiple pagination sources into one continuous pages
/// stream with cursor.
#[derive(Debug)]
pub struct Magination<T> {
    sources: Vec<Arc<Source<T>>>,
}

impl<T> Magination<T> {
    /// Build from an ordered source list; earlier sources take priority.
    ///
    /// Fails on an empty list. Source names are used as mapping keys, so a
    /// duplicate name replaces the earlier source at its original
    /// position; callers should keep names unique.
    pub fn new(sources: Vec<Source<T>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::config(
                "Magination requires at least one Source to be passed",
            ));
        }

        let mut unique: Vec<Arc<Source<T>>> = Vec::with_capacity(sources.len());
        for source in sources {
            let source = Arc::new(source);
            match unique.iter_mut().find(|s| s.name() == source.name()) {
                Some(existing) => *existing = source,
                None => unique.push(source),
            }
        }
        Ok(Self { sources: unique })
    }

    /// The configured sources, in priority order
    pub fn sources(&self) -> &[Arc<Source<T>>] {
        &self.sources
    }
}

impl<T> Magination<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Load the next set of pages starting from `cursor`.
    ///
    /// Returns a finite lazy stream which runs all still-active sources in
    /// parallel and emits one page per contributing source:
    ///
    /// - Pages come in the order of the configured sources. Even when a
    ///   lower-priority source delivers its results quicker, the sources
    ///   before it are drained first, so the result order stays
    ///   predictable while the queries overlap.
    /// - The stream is finite: it stops after exactly one pass over the
    ///   active sources, so one call runs at most `sources.len()` queries.
    /// - Every emitted page carries a cursor, so the caller may stop
    ///   consuming after any page and continue later from that cursor.
    ///   Merge state is persisted after each source's contribution, which
    ///   makes that resumption lose no progress.
    /// - Hits are deduplicated across the entire merge history; the same
    ///   hit is never emitted twice under one chain.
    /// - `None` as the input cursor starts from the beginning; `None` as
    ///   an emitted cursor means the end of the stream.
    /// - The very last configured source always yields a page, even an
    ///   empty one, so a round is never silent.
    pub fn load(
        &self,
        store: Arc<dyn Store>,
        hasher: Arc<dyn Hasher<T>>,
        cursor: Option<String>,
    ) -> PageStream<T> {
        let sources = self.sources.clone();
        Box::pin(try_stream! {
            let (slot_key, mut num) = cursor::decode(cursor.as_deref());

            let slot_read = store.read(&slot_key).await?;
            let mut slot: MergeSlot = match slot_read {
                Some(value) => serde_json::from_value(value)?,
                None => MergeSlot::new(sources.iter().map(|s| s.name())),
            };
            if slot.frames.is_empty() {
                // A hand-edited or corrupt record; reseed as fresh.
                slot = MergeSlot::new(sources.iter().map(|s| s.name()));
            }

            // An unknown position in this chain falls back to the last frame.
            num = num.min(slot.frames.len() - 1);

            let frame = slot.frames[num].clone();
            if frame.cursors.is_empty() {
                // A prior round already drained every source. Emit the
                // terminal marker page, attributed to the last source so
                // the round still has a visible end.
                if let Some(source) = sources.last().cloned() {
                    yield MergedPage {
                        hits: Vec::new(),
                        cursor: None,
                        prev_cursor: prev_cursor(&slot_key, num),
                        source,
                    };
                }
                return;
            }

            // Run all active sources in parallel against a scoped view of
            // the merge slot's cache map; the durable store sees one
            // consolidated write per drained source instead of N.
            let scoped = ScopedStore::new(slot.caches.clone());
            let mut pending = FuturesOrdered::new();
            for entry in frame.cursors.iter() {
                let Some(source) = sources
                    .iter()
                    .find(|s| s.name() == entry.source)
                    .cloned()
                else {
                    warn!(
                        source = %entry.source,
                        "frame references an unknown source, skipping"
                    );
                    continue;
                };
                let scoped = scoped.clone();
                let hasher = hasher.clone();
                let source_cursor = entry.cursor.clone();
                pending.push_back(async move {
                    let page = source
                        .load(&scoped, source_cursor.as_deref(), &[], hasher.as_ref())
                        .await?;
                    Ok::<_, Error>((source, page))
                });
            }

            if pending.is_empty() {
                // Every entry named an unknown source, so the chain cannot
                // progress under this configuration. Still end the round
                // with a visible page rather than silence.
                if let Some(source) = sources.last().cloned() {
                    yield MergedPage {
                        hits: Vec::new(),
                        cursor: None,
                        prev_cursor: prev_cursor(&slot_key, num),
                        source,
                    };
                }
                return;
            }

            // Everything handed out in frames 0..=num is excluded forever.
            let mut exclude_hashes: HashSet<String> = slot.frames[..=num]
                .iter()
                .flat_map(|frame| frame.hit_hashes.iter().cloned())
                .collect();

            let total = pending.len();
            let mut cursors = frame.cursors.clone();
            let mut drained = 0;
            while let Some(res) = pending.next().await {
                let (source, page) = res?;
                drained += 1;
                num += 1;

                // Move this source's cursor to the tail by removing and
                // re-adding it, so an interrupted round resumes with the
                // source it left off at. An exhausted source is not
                // re-added and thus drops out of all future frames.
                cursors.remove(source.name());
                if let Some(source_cursor) = page.cursor {
                    cursors.push(source.name(), Some(source_cursor));
                }

                // Keep only hits never seen under this chain.
                let mut hits = Vec::new();
                let mut hit_hashes = Vec::new();
                for hit in page.hits {
                    let hash = hasher.hash(&hit);
                    if exclude_hashes.insert(hash.clone()) {
                        hits.push(hit);
                        hit_hashes.push(hash);
                    }
                }

                slot.caches = scoped.snapshot().await;
                slot.set_frame(
                    num,
                    Frame {
                        hit_hashes,
                        cursors: cursors.clone(),
                    },
                );
                store.write(&slot_key, serde_json::to_value(&slot)?).await?;
                debug!(
                    source = %source.name(),
                    num,
                    hits = hits.len(),
                    active = cursors.len(),
                    "frame persisted"
                );

                if !hits.is_empty() || drained == total {
                    yield MergedPage {
                        hits,
                        cursor: if cursors.is_empty() {
                            None
                        } else {
                            Some(cursor::encode(&slot_key, num))
                        },
                        prev_cursor: prev_cursor(&slot_key, num),
                        source,
                    };
                }
            }
        })
    }
}

fn prev_cursor(slot_key: &str, num: usize) -> Option<String> {
    (num > 2).then(|| cursor::encode(slot_key, num - 2))
}

/// In-memory store view scoped to one merge slot's shared cache map.
///
/// Sources run by the orchestrator never touch the durable store; their
/// slot records land here and are persisted together with the merge slot.
#[derive(Clone)]
struct ScopedStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl ScopedStore {
    fn new(entries: HashMap<String, Value>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    async fn snapshot(&self) -> HashMap<String, Value> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl Store for ScopedStore {
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
