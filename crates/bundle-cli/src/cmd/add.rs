use std::fs;
use std::path::PathBuf;

use bundle_core::hash::hash_bytes;
use bundle_core::manifest_store;
use bundle_core::model::{ContentItem, ContentType};
use bundle_core::{ArtifactPath, Sha256Hex};
use serde::Serialize;

use crate::errors::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AddOut {
    path: String,
    checksum: String,
}

pub async fn run(bundle: &PathBuf, file: &PathBuf, content_type: &str, id: &str) -> anyhow::Result<()> {
    let kind = parse_content_type(content_type)?;

    let manifest_bytes = fs::read(bundle.join("manifest.json"))?;
    let mut manifest = manifest_store::parse_manifest(&manifest_bytes)?;

    let dir = type_dir(kind);
    let file_name = file
        .file_name()
        .ok_or_else(|| CliError::InvalidArgs(format!("{file:?} has no file name")))?
        .to_string_lossy()
        .into_owned();
    let rel_path = format!("{dir}/{file_name}");
    let path = ArtifactPath::new(rel_path.clone())?;
    let dest = path.resolve_within(bundle)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(file, &dest)?;

    let bytes = fs::read(&dest)?;
    let checksum = Sha256Hex::new(hash_bytes(&bytes))?;

    manifest.content.push(ContentItem {
        path,
        kind,
        id: id.to_string(),
        version: None,
        description: None,
        checksum: checksum.clone(),
        bundle_id: manifest.bundle_id.clone(),
        metadata: Default::default(),
    });

    // Re-seal checksums, but leave `signature` empty: staging content does
    // not re-sign it, the way `sign` does explicitly afterward.
    manifest.checksums.content = manifest_store::compute_content_checksums(bundle, &manifest.content)?;
    manifest.checksums.manifest = manifest_store::compute_manifest_self_hash(&manifest)?;
    manifest.signature = String::new();

    fs::write(bundle.join("manifest.json"), manifest_store::write_manifest(&manifest)?)?;

    output::print(&AddOut {
        path: rel_path,
        checksum: checksum.as_str().to_string(),
    })
}

fn type_dir(kind: ContentType) -> &'static str {
    match kind {
        ContentType::Template => "templates",
        ContentType::Module => "modules",
        ContentType::Config => "config",
        ContentType::Resource => "resources",
    }
}

fn parse_content_type(raw: &str) -> anyhow::Result<ContentType> {
    match raw {
        "template" => Ok(ContentType::Template),
        "module" => Ok(ContentType::Module),
        "config" => Ok(ContentType::Config),
        "resource" => Ok(ContentType::Resource),
        other => Err(CliError::InvalidArgs(format!("unknown content type: {other}")).into()),
    }
}
