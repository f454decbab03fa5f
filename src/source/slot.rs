//! Persisted per-source cache record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated hits and the upstream continuation token for one source
/// chain, keyed in the store by the chain's slot key.
///
/// `hits` is append-only: the slice `[0, pos)` for any previously returned
/// position is never mutated, so a cursor position always points at the
/// same stable boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct SourceSlot<T> {
    /// When this slot was first created
    pub created_at: DateTime<Utc>,
    /// Last time hits were appended
    pub updated_at: DateTime<Utc>,
    /// Every hit fetched from upstream so far, in upstream order
    #[serde(default)]
    pub hits: Vec<T>,
    /// Upstream continuation token. On a brand-new slot `None` means "not
    /// yet queried"; after a query it means "upstream exhausted". The two
    /// are told apart by whether a stored record existed before the call,
    /// never by the token shape.
    pub cursor: Option<String>,
}

impl<T> SourceSlot<T> {
    /// Create an empty, never-queried slot
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            hits: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> Default for SourceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
