use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use bundle_core::model::{Author, BundleId, BundleManifest, BundleType, Checksums, Compatibility};
use bundle_core::{manifest_store, sign, timestamp, BundleVersion};
use serde::Serialize;

use crate::errors::CliError;
use crate::io::keys;
use crate::output;

#[derive(Debug, Serialize)]
struct CreateOut {
    bundle_id: String,
    out_dir: String,
    signing_key_path: String,
    key_id: String,
}

pub async fn run(name: &str, version: &str, bundle_type: &str, out: &PathBuf) -> anyhow::Result<()> {
    let bundle_type = parse_bundle_type(bundle_type)?;
    let version = BundleVersion::parse(version)
        .map_err(|e| CliError::InvalidArgs(format!("invalid version: {e}")))?;
    let bundle_id = BundleId::new(slugify(name))
        .map_err(|e| CliError::InvalidArgs(e.to_string()))?;

    fs::create_dir_all(out).with_context(|| format!("creating bundle root {out:?}"))?;
    for dir in ["templates", "modules", "config", "documentation", "signatures"] {
        fs::create_dir_all(out.join(dir)).with_context(|| format!("creating {dir}"))?;
    }
    let readme = out.join("README.md");
    if !readme.exists() {
        fs::write(&readme, format!("# {name}\n"))?;
    }

    let (public, private) = sign::generate_keypair();
    let key_id = sign::compute_key_id(&public)?;
    let created_at = timestamp::to_rfc3339_utc(time::OffsetDateTime::now_utc())?;

    let manifest = BundleManifest {
        schema_version: bundle_core::version::SCHEMA_VERSION_1_0.to_string(),
        bundle_id: bundle_id.clone(),
        bundle_type,
        name: name.to_string(),
        description: String::new(),
        version,
        created_at,
        author: Author {
            name: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            email: String::new(),
            url: None,
            key_id: Some(key_id.clone()),
        },
        content: Vec::new(),
        checksums: Checksums::default(),
        compatibility: Compatibility::default(),
        signature: String::new(),
        compliance: None,
        changelog: None,
        documentation: None,
        is_incremental: false,
        base_version: None,
    };

    let sealed = manifest_store::seal_manifest(manifest, out, Some(&private))?;
    fs::write(out.join("manifest.json"), manifest_store::write_manifest(&sealed)?)?;

    seal_offline_signature(out, &private)?;
    keys::save_public_key(&out.join("signatures/public-key.pem"), &public)?;

    let key_path = sibling_key_path(out);
    keys::save_signing_key(&key_path, &private)?;

    output::print(&CreateOut {
        bundle_id: bundle_id.as_str().to_string(),
        out_dir: out.display().to_string(),
        signing_key_path: key_path.display().to_string(),
        key_id,
    })
}

/// Build and write `signatures/bundle.sig` and the sorted file-hash
/// manifest it signs over.
pub(crate) fn seal_offline_signature(bundle: &std::path::Path, private: &ed25519_dalek::SigningKey) -> anyhow::Result<()> {
    let (entries, content_hash) = manifest_store::build_file_hash_manifest(bundle)?;
    let timestamp = timestamp::to_rfc3339_utc(time::OffsetDateTime::now_utc())?;
    let envelope = sign::sign_envelope(content_hash, timestamp, private, Default::default())?;
    fs::write(bundle.join("signatures/bundle.sig"), serde_json::to_vec_pretty(&envelope)?)?;
    fs::write(
        bundle.join("signatures/manifest.json"),
        bundle_core::canonical::to_canonical_bytes(&entries)?,
    )?;
    Ok(())
}

/// Where `create`/`sign` persist the private signing key: a PEM file next
/// to the bundle directory, never inside it (the bundle tree is meant to
/// be distributed; the private key never should be). See DESIGN.md for the
/// reasoning.
fn sibling_key_path(out: &std::path::Path) -> PathBuf {
    let file_name = out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle".to_string());
    out.with_file_name(format!("{file_name}.signing-key.pem"))
}

fn parse_bundle_type(raw: &str) -> anyhow::Result<BundleType> {
    match raw {
        "templates" => Ok(BundleType::Templates),
        "modules" => Ok(BundleType::Modules),
        "mixed" => Ok(BundleType::Mixed),
        other => Err(CliError::InvalidArgs(format!("unknown bundle type: {other}")).into()),
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.' { c } else { '-' })
        .collect()
}
