//! Canonical JSON encoding used as hashing and signing input.
//!
//! Built on `serde_jcs` (RFC 8785 JSON Canonicalization Scheme), the same
//! crate `assay-evidence::crypto::jcs` wraps: lexicographic key ordering, no
//! insignificant whitespace, UTF-8 output, IEEE-754 number normalization.
//! Null/empty-field omission is handled by `#[serde(skip_serializing_if)]`
//! on the model types themselves (see [`crate::model`]) rather than here,
//! so the encoder stays a pure, reusable "serialize this value canonically"
//! primitive — same division of responsibility `signia-core::model`
//! describes ("canonical bytes used for hashing are produced by
//! `crate::canonical`, not by default serde formatting").
//!
//! Timestamps are a separate concern: every timestamp field in the model
//! is stored as an RFC 3339 UTC string (see [`crate::timestamp`]) before it
//! ever reaches serde, so canonicalization never has to rewrite a timestamp
//! representation.

use serde::Serialize;

use crate::errors::{BundleError, BundleResult};

/// Serialize a value to canonical JSON bytes.
///
/// Two values that are `==` under `serde_json::Value` equality always
/// produce byte-identical output, on every platform: this is the contract
/// spec §4.1 calls "deterministic: two equal values produce byte-identical
/// output on all platforms."
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> BundleResult<Vec<u8>> {
    serde_jcs::to_vec(value).map_err(|e| BundleError::validation(format!("canonical encode: {e}")))
}

/// Serialize a value to a canonical JSON string.
pub fn to_canonical_string<T: Serialize>(value: &T) -> BundleResult<String> {
    serde_jcs::to_string(value).map_err(|e| BundleError::validation(format!("canonical encode: {e}")))
}

/// Canonicalize an already-parsed `serde_json::Value`.
///
/// Useful when a caller has loose JSON (e.g. from a file on disk) and wants
/// the canonical bytes without round-tripping through a typed struct.
pub fn canonicalize_value(value: &serde_json::Value) -> BundleResult<Vec<u8>> {
    to_canonical_bytes(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted() {
        let v = json!({"z": 1, "a": 2});
        let s = to_canonical_string(&v).unwrap();
        assert_eq!(s, r#"{"a":2,"z":1}"#);
    }

    #[test]
    fn no_whitespace() {
        let v = json!({"a": [1, 2, 3]});
        let s = to_canonical_string(&v).unwrap();
        assert!(!s.contains(' '));
        assert!(!s.contains('\n'));
    }

    #[test]
    fn equal_values_produce_identical_bytes() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(to_canonical_bytes(&a).unwrap(), to_canonical_bytes(&b).unwrap());
    }

    #[test]
    fn arrays_preserve_source_order() {
        let v = json!({"xs": [3, 1, 2]});
        let s = to_canonical_string(&v).unwrap();
        assert_eq!(s, r#"{"xs":[3,1,2]}"#);
    }
}
