//! Deterministic content hashing.
//!
//! Mirrors `signia-core::determinism::hashing`'s "no implicit defaults"
//! stance (SHA-256 only, explicitly named), extended to a streaming
//! `Read`-based API so hashing a file never requires buffering it whole
//! (spec §4.1: "Streaming is required; arbitrary file sizes must not force
//! full buffering").

use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{BundleError, BundleResult};

/// A `sha256:<hex>` digest string, as used throughout manifests and
/// signature envelopes.
pub fn format_digest(raw: &[u8]) -> String {
    format!("sha256:{}", hex::encode(raw))
}

/// A validated `sha256:<64 lowercase hex chars>` digest, following the
/// newtype-with-validation style of `leynos-whitaker::installer::artefact`'s
/// `Sha256Digest`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    pub fn new(raw: impl Into<String>) -> BundleResult<Self> {
        let raw = raw.into();
        let hex_part = raw.strip_prefix("sha256:").ok_or_else(|| {
            BundleError::validation(format!("digest missing 'sha256:' prefix: {raw:?}"))
        })?;
        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            return Err(BundleError::validation(format!(
                "digest is not 64 lowercase hex chars: {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn from_bytes(raw: &[u8]) -> Self {
        Self(format_digest(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Sha256Hex {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Streaming hash of a reader's full contents. Never buffers more than a
/// fixed-size chunk at a time.
pub fn hash_reader<R: Read>(mut reader: R) -> BundleResult<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| BundleError::filesystem(format!("read during hashing: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format_digest(&hasher.finalize()))
}

/// Hash a byte slice directly (small, already in-memory payloads such as
/// canonical manifest bytes).
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format_digest(&hasher.finalize())
}

/// Hash a `Serialize` value via its canonical JSON encoding.
///
/// This is the hash used for manifest self-hashes and for signing input;
/// see [`crate::canonical`] for the encoding rules.
pub fn hash_canonical<T: Serialize>(value: &T) -> BundleResult<String> {
    let bytes = crate::canonical::to_canonical_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Copy a reader into a writer while also returning the digest of the
/// bytes copied, without buffering the whole stream.
pub fn hash_and_copy<R: Read, W: io::Write>(mut reader: R, mut writer: W) -> BundleResult<(u64, String)> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| BundleError::filesystem(format!("read during hash_and_copy: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .map_err(|e| BundleError::filesystem(format!("write during hash_and_copy: {e}")))?;
        total += n as u64;
    }
    Ok((total, format_digest(&hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn hash_reader_is_stable() {
        let h1 = hash_reader(Cursor::new(b"abc")).unwrap();
        let h2 = hash_reader(Cursor::new(b"abc")).unwrap();
        assert_eq!(h1, h2);
        assert!(h1.starts_with("sha256:"));
    }

    #[test]
    fn hash_bytes_matches_reader() {
        let a = hash_bytes(b"hello world");
        let b = hash_reader(Cursor::new(b"hello world")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn byte_flip_changes_hash() {
        let a = hash_bytes(b"hello world");
        let b = hash_bytes(b"hEllo world");
        assert_ne!(a, b);
    }

    #[test]
    fn hash_and_copy_preserves_bytes() {
        let mut out = Vec::new();
        let (n, h) = hash_and_copy(Cursor::new(b"payload"), &mut out).unwrap();
        assert_eq!(n, 7);
        assert_eq!(out, b"payload");
        assert_eq!(h, hash_bytes(b"payload"));
    }

    #[test]
    fn sha256_hex_accepts_well_formed_digest() {
        let digest = hash_bytes(b"abc");
        assert!(Sha256Hex::new(digest).is_ok());
    }

    #[test]
    fn sha256_hex_rejects_missing_prefix() {
        assert!(Sha256Hex::new("0".repeat(64)).is_err());
    }

    #[test]
    fn sha256_hex_rejects_wrong_length() {
        assert!(Sha256Hex::new("sha256:abcd").is_err());
    }
}
