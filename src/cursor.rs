//! Cursor codec
//!
//! A cursor is an opaque ASCII token `"<key>:<seq>"` where the key
//! identifies a persisted slot record and the sequence number indexes into
//! history within that record. Decoding never fails: a malformed or
//! unrecognized token degrades to "start a fresh chain" under a newly
//! generated key.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

const CURSOR_SEP: char = ':';

// ASCII classes only: the wire format is ASCII, and Rust's `\w`/`\d`
// would otherwise admit Unicode keys and digits.
static CURSOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9A-Za-z_]{1,32}):([0-9]{1,6})$").expect("cursor regex is valid")
});

/// Generate a fresh slot key.
///
/// Keys are collision-resistant across concurrent independent streams, so
/// no coordination between callers is needed. The simple uuid format is 32
/// hex characters, which fits the cursor key grammar exactly.
pub fn new_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Decode a cursor into its `(slot_key, sequence_number)` pair.
///
/// Anything that does not match the cursor grammar is treated as the start
/// of a new chain rather than rejected.
pub fn decode(cursor: Option<&str>) -> (String, usize) {
    if let Some(caps) = cursor.and_then(|c| CURSOR_RE.captures(c)) {
        let key = caps[1].to_string();
        let seq = caps[2].parse().unwrap_or(0);
        (key, seq)
    } else {
        if cursor.is_some() {
            debug!(?cursor, "unrecognized cursor, starting a fresh chain");
        }
        (new_key(), 0)
    }
}

/// Encode a `(slot_key, sequence_number)` pair into a cursor.
pub fn encode(slot_key: &str, num: usize) -> String {
    format!("{slot_key}{CURSOR_SEP}{num}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid() {
        let (key, num) = decode(Some("abc123:42"));
        assert_eq!(key, "abc123");
        assert_eq!(num, 42);

        let (key, num) = decode(Some("k:0"));
        assert_eq!(key, "k");
        assert_eq!(num, 0);
    }

    #[test]
    fn test_encode_roundtrip() {
        let cursor = encode("deadbeef", 7);
        assert_eq!(cursor, "deadbeef:7");
        assert_eq!(decode(Some(&cursor)), ("deadbeef".to_string(), 7));
    }

    #[test]
    fn test_decode_none_starts_fresh() {
        let (key, num) = decode(None);
        assert!(CURSOR_RE.is_match(&encode(&key, 0)));
        assert_eq!(num, 0);
    }

    #[test]
    fn test_decode_malformed_starts_fresh() {
        for bad in [
            "",
            "no-separator",
            "two:colons:here",
            "spaces in key:1",
            "key:notanumber",
            // key longer than 32 word characters
            "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:1",
            // sequence longer than 6 digits
            "key:1234567",
            // the wire format is ASCII; Unicode word characters and
            // digits are not part of the grammar
            "décodé:1",
            "key:١٢٣",
        ] {
            let (key, num) = decode(Some(bad));
            // A rejected cursor degrades to a freshly generated key.
            assert_eq!(key.len(), 32, "{bad:?} must not be accepted");
            assert_eq!(num, 0);
        }
    }

    #[test]
    fn test_new_key_shape_and_uniqueness() {
        let a = new_key();
        let b = new_key();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
