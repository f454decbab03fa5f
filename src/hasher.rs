//! Item hashing for dedup exclusion sets
//!
//! A hasher produces a stable, deterministic string per logically-equal
//! item. Hashes are only ever compared for equality, so any practically
//! collision-resistant encoding works.

use serde::Serialize;

/// Computes a stable identity string for an item.
pub trait Hasher<T>: Send + Sync {
    /// Hash one item. Must be pure and deterministic.
    fn hash(&self, item: &T) -> String;
}

impl<T, F> Hasher<T> for F
where
    F: Fn(&T) -> String + Send + Sync,
{
    fn hash(&self, item: &T) -> String {
        self(item)
    }
}

/// Hashes an item by its JSON encoding.
///
/// Suitable whenever two logically equal items serialize identically,
/// which holds for plain data types with derived `Serialize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHasher;

impl<T: Serialize> Hasher<T> for JsonHasher {
    fn hash(&self, item: &T) -> String {
        serde_json::to_string(item).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Doc {
        id: u64,
        kind: &'static str,
    }

    #[test]
    fn test_closure_hasher() {
        let hasher = |item: &u32| item.to_string();
        assert_eq!(Hasher::hash(&hasher, &7), "7");
    }

    #[test]
    fn test_json_hasher_deterministic() {
        let hasher = JsonHasher;
        let a = Doc { id: 1, kind: "note" };
        let b = Doc { id: 1, kind: "note" };
        let c = Doc { id: 2, kind: "note" };
        assert_eq!(hasher.hash(&a), hasher.hash(&b));
        assert_ne!(hasher.hash(&a), hasher.hash(&c));
    }
}
