use std::fs;
use std::path::{Path, PathBuf};

use bundle_core::manifest_store;
use bundle_core::model::{BundleManifest, SignatureEnvelope};
use bundle_core::sign::{self, VerifyStatus};
use bundle_policy::schema::{default_schema, validate_structure, IssueSeverity};
use ed25519_dalek::VerifyingKey;
use serde::Serialize;

use crate::errors::CliError;
use crate::io::keys;
use crate::output;

#[derive(Debug, Serialize)]
struct VerifyOut {
    bundle: String,
    status: String,
    structure_warnings: Vec<String>,
}

pub async fn run(bundle: &PathBuf, pubkey: &PathBuf) -> anyhow::Result<()> {
    let public = keys::load_public_key(pubkey)?;

    let manifest_bytes = fs::read(bundle.join("manifest.json"))?;
    let manifest = manifest_store::parse_manifest(&manifest_bytes)?;

    manifest_store::verify_content_checksums(&manifest, bundle)
        .map_err(|e| CliError::VerificationFailed(e.to_string()))?;

    let status = verify_signature(bundle, &manifest, &public)?;
    if status != VerifyStatus::Valid {
        return Err(CliError::VerificationFailed(format!("signature check returned {status:?}")).into());
    }

    let issues = validate_structure(&default_schema(), bundle)?;
    let fatal: Vec<_> = issues.iter().filter(|i| i.severity == IssueSeverity::Fatal).collect();
    if !fatal.is_empty() {
        return Err(CliError::VerificationFailed(format!(
            "{} fatal structure issue(s): {}",
            fatal.len(),
            fatal.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; ")
        ))
        .into());
    }

    output::print(&VerifyOut {
        bundle: bundle.display().to_string(),
        status: format!("{status:?}"),
        structure_warnings: issues.into_iter().map(|i| i.message).collect(),
    })
}

/// Prefer the offline envelope (`signatures/bundle.sig`) when present, since
/// it is authoritative over the inline `manifest.signature` field; fall
/// back to the inline signature for bundles shipped without one.
fn verify_signature(bundle: &Path, manifest: &BundleManifest, public: &VerifyingKey) -> anyhow::Result<VerifyStatus> {
    let envelope_path = bundle.join("signatures/bundle.sig");
    if envelope_path.exists() {
        let bytes = fs::read(&envelope_path)?;
        let envelope: SignatureEnvelope = serde_json::from_slice(&bytes)?;
        let key_id = sign::compute_key_id(public)?;
        let mut keyring = bundle_core::keys::KeyRing::new();
        keyring.insert(key_id, *public);
        Ok(sign::verify_envelope(&envelope, &keyring)?)
    } else {
        Ok(manifest_store::verify_manifest_integrity(manifest, public)?)
    }
}
