use std::path::Path;

use anyhow::{Context as _, Result};
use bundle_core::ArtifactPath;

/// Every regular file under `root`, as bundle-relative [`ArtifactPath`]s,
/// sorted by path. Mirrors the walk `manifest_store::build_file_hash_manifest`
/// performs, without the hashing.
pub fn collect_artifact_paths(root: &Path) -> Result<Vec<ArtifactPath>> {
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking {root:?}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root)?;
        let slash_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        paths.push(ArtifactPath::new(slash_path)?);
    }
    paths.sort();
    Ok(paths)
}
