//! Canonical JSON serialization (SPEC_FULL.md §3 "canonical serialization").
//!
//! Used by C6 to hash journal entry content for duplicate-key detection
//! within the same second, and by C7 idempotency checks. Grounded in the
//! teacher's use of `serde_json_canonicalizer` for receipt hashing.

use serde::Serialize;

/// Canonicalize a serializable value to JCS (RFC 8785) bytes: sorted object
/// keys, stable number formatting. Panics only on serialization bugs
/// (non-finite floats, cyclic `Rc`), which cannot occur for this crate's
/// plain-data model types.
#[must_use]
pub fn canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    let value = serde_json::to_value(value).expect("model types are always representable as JSON");
    serde_json_canonicalizer::to_vec(&value).expect("canonicalization of plain JSON cannot fail")
}

/// BLAKE3 hash of a value's canonical form, hex-encoded.
#[must_use]
pub fn content_hash<T: Serialize>(value: &T) -> String {
    blake3::hash(&canonical_bytes(value)).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn different_content_hashes_differ() {
        assert_ne!(content_hash(&json!({"a": 1})), content_hash(&json!({"a": 2})));
    }
}
