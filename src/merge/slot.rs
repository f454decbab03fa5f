//! Persisted merge-chain state
//!
//! A merge chain's whole history lives in one [`MergeSlot`] record: an
//! append-only list of [`Frame`]s plus the flattened union of every
//! source's private cache records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Insertion-ordered `source name -> cursor` map.
///
/// Iteration order encodes source priority and must survive JSON round
/// trips, which a hash map's incidental key ordering would not guarantee.
/// The maps are tiny (one entry per active source), so linear scans are
/// fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorSet {
    entries: Vec<CursorEntry>,
}

/// One source's cursor within a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorEntry {
    /// Source name
    pub source: String,
    /// The source's own cursor; `None` when the source has not been
    /// queried yet in this chain
    pub cursor: Option<String>,
}

impl CursorSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every name mapped to `None`, in the given order
    pub fn seed<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|name| CursorEntry {
                    source: name.to_string(),
                    cursor: None,
                })
                .collect(),
        }
    }

    /// Cursor stored for `source`, if the source is still active
    pub fn get(&self, source: &str) -> Option<&Option<String>> {
        self.entries
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| &entry.cursor)
    }

    /// Remove `source`; returns whether it was present
    pub fn remove(&mut self, source: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.source != source);
        self.entries.len() != before
    }

    /// Append `source` at the tail
    pub fn push(&mut self, source: impl Into<String>, cursor: Option<String>) {
        self.entries.push(CursorEntry {
            source: source.into(),
            cursor,
        });
    }

    /// Whether no sources are active
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of active sources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in priority order
    pub fn iter(&self) -> std::slice::Iter<'_, CursorEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a CursorSet {
    type Item = &'a CursorEntry;
    type IntoIter = std::slice::Iter<'a, CursorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One immutable step in a merge chain's history.
///
/// A frame is never rewritten after being persisted, except by a replay
/// writing back identical content; this is what makes any previously
/// emitted cursor deterministically replayable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Hashes of the hits this step contributed
    pub hit_hashes: Vec<String>,
    /// Snapshot of every still-active source's cursor after this step.
    /// Once a source is exhausted its entry is gone for good; an empty set
    /// in the latest frame means the whole stream is exhausted.
    pub cursors: CursorSet,
}

/// Persisted state of one merge-load chain, keyed by the chain's slot key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSlot {
    /// When this chain was started
    pub created_at: DateTime<Utc>,
    /// Flattened union of every source's private cache records. Sources
    /// run by the orchestrator read and write here instead of the durable
    /// store, so one consolidated write per step replaces N independent
    /// ones.
    #[serde(default)]
    pub caches: HashMap<String, Value>,
    /// Append-only history, one frame per drained source
    pub frames: Vec<Frame>,
}

impl MergeSlot {
    /// Fresh slot whose frame 0 seeds every source as "not started"
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            created_at: Utc::now(),
            caches: HashMap::new(),
            frames: vec![Frame {
                hit_hashes: Vec::new(),
                cursors: CursorSet::seed(names),
            }],
        }
    }

    /// Write `frame` at index `num`, appending when `num` is one past the
    /// end. Existing frames are only ever overwritten by replays carrying
    /// identical content.
    pub fn set_frame(&mut self, num: usize, frame: Frame) {
        if num < self.frames.len() {
            self.frames[num] = frame;
        } else {
            self.frames.push(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_set_preserves_insertion_order() {
        let mut set = CursorSet::seed(["alpha", "beta", "gamma"]);
        assert_eq!(set.len(), 3);

        set.remove("alpha");
        set.push("alpha", Some("k:2".to_string()));

        let order: Vec<&str> = set.iter().map(|e| e.source.as_str()).collect();
        assert_eq!(order, vec!["beta", "gamma", "alpha"]);
        assert_eq!(set.get("alpha"), Some(&Some("k:2".to_string())));
        assert_eq!(set.get("beta"), Some(&None));
        assert_eq!(set.get("missing"), None);
    }

    #[test]
    fn test_cursor_set_order_survives_json() {
        let set = CursorSet::seed(["z", "a", "m"]);
        let json = serde_json::to_string(&set).unwrap();
        let restored: CursorSet = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, set);
    }

    #[test]
    fn test_merge_slot_frame_zero() {
        let slot = MergeSlot::new(["s1", "s2"]);
        assert_eq!(slot.frames.len(), 1);
        assert!(slot.frames[0].hit_hashes.is_empty());
        assert_eq!(slot.frames[0].cursors.len(), 2);
        assert!(slot.caches.is_empty());
    }

    #[test]
    fn test_set_frame_appends_and_overwrites() {
        let mut slot = MergeSlot::new(["s1"]);
        let frame = Frame {
            hit_hashes: vec!["h1".to_string()],
            cursors: CursorSet::new(),
        };

        slot.set_frame(1, frame.clone());
        assert_eq!(slot.frames.len(), 2);

        slot.set_frame(1, frame.clone());
        assert_eq!(slot.frames.len(), 2);
        assert_eq!(slot.frames[1], frame);
    }
}
