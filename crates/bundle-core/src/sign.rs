//! Ed25519 signing and verification (C3).
//!
//! Two signing inputs are supported, matching spec §4.2/§4.3:
//! - the `BundleManifest` itself, with `signature` and `checksums.manifest`
//!   cleared before canonical encoding;
//! - the offline [`SignatureEnvelope`], whose signing input is the record
//!   `{version, algorithm, key_id, timestamp, content_hash, metadata}`
//!   (i.e. the envelope minus its own `signature` field).
//!
//! Unlike `assay-evidence::mandate::signing`'s DSSE/PAE-wrapped approach,
//! this module signs the canonical bytes directly — spec.md does not call
//! for a PAE envelope, and adding one would be an unrequested redesign (see
//! the open question recorded in `DESIGN.md`). The key-id-by-SPKI-hash
//! convention is still borrowed from that module, since it is a good fit
//! for "public keys are addressed by an implementation-opaque `key_id`
//! string" (spec §4.2).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::pkcs8::EncodePublicKey;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{BundleError, BundleResult};
use crate::model::{BundleManifest, SignatureEnvelope};

/// Outcome of a verification attempt. Kept as a closed enum (rather than a
/// bare `bool`) so callers can distinguish "tampered" from "never signed"
/// from "don't know this key", per spec §4.2's three named failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Valid,
    MissingSignature,
    KeyMismatch,
    BadSignature,
    UnknownKey,
}

impl VerifyStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyStatus::Valid)
    }
}

/// Generate a fresh Ed25519 keypair.
pub fn generate_keypair() -> (VerifyingKey, SigningKey) {
    let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}

/// Derive the canonical `key_id` for a public key: `sha256:<hex>` of its
/// SPKI DER encoding.
pub fn compute_key_id(key: &VerifyingKey) -> BundleResult<String> {
    let doc = key
        .to_public_key_der()
        .map_err(|e| BundleError::signature(format!("failed to encode public key as SPKI DER: {e}")))?;
    let digest = Sha256::digest(doc.as_bytes());
    Ok(format!("sha256:{}", hex::encode(digest)))
}

/// Build the manifest's signing input: canonical bytes of the manifest
/// with `signature` and `checksums.manifest` cleared.
fn manifest_signing_input(manifest: &BundleManifest) -> BundleResult<Vec<u8>> {
    let mut stripped = manifest.clone();
    stripped.signature = String::new();
    stripped.checksums.manifest = String::new();
    crate::canonical::to_canonical_bytes(&stripped)
}

/// Sign a manifest, returning the base64-encoded Ed25519 signature.
/// `checksums.manifest` must already be sealed by the caller (see
/// [`crate::manifest_store`]) before this is called.
pub fn sign_manifest(manifest: &BundleManifest, key: Option<&SigningKey>) -> BundleResult<String> {
    let key = key.ok_or_else(|| BundleError::signature("no private key available to sign"))?;
    let input = manifest_signing_input(manifest)?;
    let signature: Signature = key.sign(&input);
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verify a manifest's inline `signature` field against `public_key`.
pub fn verify_manifest(manifest: &BundleManifest, public_key: &VerifyingKey) -> BundleResult<VerifyStatus> {
    if manifest.signature.is_empty() {
        return Ok(VerifyStatus::MissingSignature);
    }
    let sig_bytes = match BASE64.decode(&manifest.signature) {
        Ok(b) => b,
        Err(_) => return Ok(VerifyStatus::BadSignature),
    };
    let signature = match Signature::from_slice(&sig_bytes) {
        Ok(s) => s,
        Err(_) => return Ok(VerifyStatus::BadSignature),
    };
    let input = manifest_signing_input(manifest)?;
    match public_key.verify(&input, &signature) {
        Ok(()) => Ok(VerifyStatus::Valid),
        Err(_) => Ok(VerifyStatus::BadSignature),
    }
}

/// Verify a manifest's signature using a key looked up from a
/// [`crate::keys::KeyRing`] by `key_id`. Returns `UnknownKey` when the
/// `key_id` is not registered, distinct from `BadSignature`.
pub fn verify_manifest_with_keyring(
    manifest: &BundleManifest,
    keyring: &crate::keys::KeyRing,
    key_id: &str,
) -> BundleResult<VerifyStatus> {
    let key = match keyring.get(key_id) {
        Ok(k) => k,
        Err(_) => return Ok(VerifyStatus::UnknownKey),
    };
    verify_manifest(manifest, key)
}

/// The signing input for a [`SignatureEnvelope`]: everything except its
/// own `signature` field.
#[derive(Serialize, Deserialize)]
struct SignableEnvelope<'a> {
    version: u32,
    algorithm: &'a str,
    key_id: &'a str,
    timestamp: &'a str,
    content_hash: &'a str,
    metadata: &'a crate::model::SignatureMetadata,
}

fn envelope_signing_input(envelope: &SignatureEnvelope) -> BundleResult<Vec<u8>> {
    let signable = SignableEnvelope {
        version: envelope.version,
        algorithm: &envelope.algorithm,
        key_id: &envelope.key_id,
        timestamp: &envelope.timestamp,
        content_hash: &envelope.content_hash,
        metadata: &envelope.metadata,
    };
    crate::canonical::to_canonical_bytes(&signable)
}

/// Build and sign a fresh [`SignatureEnvelope`] over a content hash
/// (produced by [`crate::manifest_store::build_file_hash_manifest`]).
pub fn sign_envelope(
    content_hash: String,
    timestamp: String,
    key: &SigningKey,
    metadata: crate::model::SignatureMetadata,
) -> BundleResult<SignatureEnvelope> {
    let key_id = compute_key_id(&key.verifying_key())?;
    let mut envelope = SignatureEnvelope {
        version: 1,
        algorithm: "Ed25519".to_string(),
        key_id,
        timestamp,
        content_hash,
        signature: String::new(),
        metadata,
    };
    let input = envelope_signing_input(&envelope)?;
    let signature: Signature = key.sign(&input);
    envelope.signature = BASE64.encode(signature.to_bytes());
    Ok(envelope)
}

/// Verify a [`SignatureEnvelope`] against a keyring, by its declared
/// `key_id`.
pub fn verify_envelope(
    envelope: &SignatureEnvelope,
    keyring: &crate::keys::KeyRing,
) -> BundleResult<VerifyStatus> {
    if envelope.signature.is_empty() {
        return Ok(VerifyStatus::MissingSignature);
    }
    let key = match keyring.get(&envelope.key_id) {
        Ok(k) => k,
        Err(_) => return Ok(VerifyStatus::UnknownKey),
    };
    let actual_key_id = compute_key_id(key)?;
    if actual_key_id != envelope.key_id {
        return Ok(VerifyStatus::KeyMismatch);
    }
    let sig_bytes = match BASE64.decode(&envelope.signature) {
        Ok(b) => b,
        Err(_) => return Ok(VerifyStatus::BadSignature),
    };
    let signature = match Signature::from_slice(&sig_bytes) {
        Ok(s) => s,
        Err(_) => return Ok(VerifyStatus::BadSignature),
    };
    let input = envelope_signing_input(envelope)?;
    match key.verify(&input, &signature) {
        Ok(()) => Ok(VerifyStatus::Valid),
        Err(_) => Ok(VerifyStatus::BadSignature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha256Hex;
    use crate::model::*;
    use crate::path::ArtifactPath;
    use crate::version::BundleVersion;
    use std::collections::BTreeMap;

    fn sample_manifest() -> BundleManifest {
        BundleManifest {
            schema_version: "1.0".to_string(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            bundle_type: BundleType::Templates,
            name: "demo".to_string(),
            description: "demo bundle".to_string(),
            version: BundleVersion::parse("1.0.0").unwrap(),
            created_at: "2026-07-26T00:00:00Z".to_string(),
            author: Author {
                name: "a".to_string(),
                email: "a@example.com".to_string(),
                url: None,
                key_id: None,
            },
            content: vec![ContentItem {
                path: ArtifactPath::new("templates/hello.json").unwrap(),
                kind: ContentType::Template,
                id: "t1".to_string(),
                version: Some("1.0.0".to_string()),
                description: None,
                checksum: Sha256Hex::new(crate::hash::hash_bytes(b"{\"id\":\"t1\"}")).unwrap(),
                bundle_id: BundleId::new("demo-bundle").unwrap(),
                metadata: BTreeMap::new(),
            }],
            checksums: Checksums::default(),
            compatibility: Compatibility::default(),
            signature: String::new(),
            compliance: None,
            changelog: None,
            documentation: None,
            is_incremental: false,
            base_version: None,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let (public, private) = generate_keypair();
        let mut manifest = sample_manifest();
        let sig = sign_manifest(&manifest, Some(&private)).unwrap();
        manifest.signature = sig;
        assert_eq!(verify_manifest(&manifest, &public).unwrap(), VerifyStatus::Valid);
    }

    #[test]
    fn tampering_after_signing_is_detected() {
        let (public, private) = generate_keypair();
        let mut manifest = sample_manifest();
        manifest.signature = sign_manifest(&manifest, Some(&private)).unwrap();
        manifest.description = "tampered".to_string();
        assert_eq!(verify_manifest(&manifest, &public).unwrap(), VerifyStatus::BadSignature);
    }

    #[test]
    fn missing_signature_is_reported() {
        let (public, _private) = generate_keypair();
        let manifest = sample_manifest();
        assert_eq!(
            verify_manifest(&manifest, &public).unwrap(),
            VerifyStatus::MissingSignature
        );
    }

    #[test]
    fn wrong_key_fails() {
        let (_public1, private1) = generate_keypair();
        let (public2, _private2) = generate_keypair();
        let mut manifest = sample_manifest();
        manifest.signature = sign_manifest(&manifest, Some(&private1)).unwrap();
        assert_eq!(verify_manifest(&manifest, &public2).unwrap(), VerifyStatus::BadSignature);
    }

    #[test]
    fn no_private_key_reports_error() {
        let manifest = sample_manifest();
        assert!(sign_manifest(&manifest, None).is_err());
    }

    #[test]
    fn key_id_is_stable_for_same_key() {
        let (public, _private) = generate_keypair();
        let a = compute_key_id(&public).unwrap();
        let b = compute_key_id(&public).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
    }

    #[test]
    fn envelope_sign_and_verify_round_trip() {
        let (public, private) = generate_keypair();
        let mut keyring = crate::keys::KeyRing::new();
        let key_id = compute_key_id(&public).unwrap();
        keyring.insert(key_id, public);
        let envelope = sign_envelope(
            crate::hash::hash_bytes(b"content"),
            "2026-07-26T00:00:00Z".to_string(),
            &private,
            SignatureMetadata::default(),
        )
        .unwrap();
        assert_eq!(verify_envelope(&envelope, &keyring).unwrap(), VerifyStatus::Valid);
    }

    #[test]
    fn envelope_unknown_key_id_reported() {
        let (_public, private) = generate_keypair();
        let keyring = crate::keys::KeyRing::new();
        let envelope = sign_envelope(
            crate::hash::hash_bytes(b"content"),
            "2026-07-26T00:00:00Z".to_string(),
            &private,
            SignatureMetadata::default(),
        )
        .unwrap();
        assert_eq!(
            verify_envelope(&envelope, &keyring).unwrap(),
            VerifyStatus::UnknownKey
        );
    }
}
