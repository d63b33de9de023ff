use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use bundle_core::manifest_store;
use bundle_core::model::{BundleManifest, ContentItem};

use crate::report::{DiffReport, ReportFormat};

/// Compare two bundle manifests without touching either bundle's files:
/// unlike `delta`, this never stats payloads, so it works against a remote
/// manifest fetched without the matching archive.
pub async fn run(local: &PathBuf, remote: &PathBuf, format: &str) -> anyhow::Result<()> {
    let local_manifest = manifest_store::parse_manifest(&fs::read(local.join("manifest.json"))?)?;
    let remote_manifest = manifest_store::parse_manifest(&fs::read(remote.join("manifest.json"))?)?;

    let format = ReportFormat::parse(format)?;
    let report = diff_report(&local_manifest, &remote_manifest);
    println!("{}", report.render(format));
    Ok(())
}

fn path_map(manifest: &BundleManifest) -> BTreeMap<&str, &ContentItem> {
    manifest.content.iter().map(|item| (item.path.as_str(), item)).collect()
}

fn diff_report(local: &BundleManifest, remote: &BundleManifest) -> DiffReport {
    let local_items = path_map(local);
    let remote_items = path_map(remote);

    let mut added = Vec::new();
    let mut updated = Vec::new();
    for (path, remote_item) in &remote_items {
        match local_items.get(path) {
            None => added.push((*path).to_string()),
            Some(local_item) => {
                if local_item.checksum != remote_item.checksum {
                    updated.push((*path).to_string());
                }
            }
        }
    }
    let mut removed: Vec<String> = local_items.keys().filter(|p| !remote_items.contains_key(*p)).map(|p| p.to_string()).collect();

    added.sort();
    updated.sort();
    removed.sort();

    DiffReport {
        local_version: local.version.as_str().to_string(),
        remote_version: remote.version.as_str().to_string(),
        added,
        updated,
        removed,
    }
}
