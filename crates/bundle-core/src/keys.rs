//! Public-key registry.
//!
//! `key_id -> VerifyingKey`, with a PEM/PKCS8 loader matching the
//! `assay-evidence::mandate::signing` / `assay-core` PEM handling
//! (`ed25519-dalek`'s `pkcs8`+`pem` features). Exists because §4.2's
//! verification contract needs *some* place to look up a `key_id` and
//! report `UnknownKey` when it is missing.

use std::collections::BTreeMap;

use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::VerifyingKey;

use crate::errors::{BundleError, BundleResult};

/// An in-memory map of known signer public keys, addressed by `key_id`.
#[derive(Debug, Default, Clone)]
pub struct KeyRing {
    keys: BTreeMap<String, VerifyingKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under an explicit `key_id` (use
    /// [`crate::sign::compute_key_id`] to derive the canonical id from the
    /// key itself, or pass a caller-chosen alias).
    pub fn insert(&mut self, key_id: impl Into<String>, key: VerifyingKey) {
        self.keys.insert(key_id.into(), key);
    }

    /// Load a PEM-encoded (PKCS8 SubjectPublicKeyInfo) Ed25519 public key
    /// and register it under its canonical SPKI-hash key id.
    pub fn load_pem(&mut self, pem: &str) -> BundleResult<String> {
        let key = VerifyingKey::from_public_key_pem(pem)
            .map_err(|e| BundleError::signature(format!("invalid public key PEM: {e}")))?;
        let key_id = crate::sign::compute_key_id(&key)?;
        self.insert(key_id.clone(), key);
        Ok(key_id)
    }

    pub fn get(&self, key_id: &str) -> BundleResult<&VerifyingKey> {
        self.keys
            .get(key_id)
            .ok_or_else(|| BundleError::signature(format!("unknown key_id: {key_id}")))
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
