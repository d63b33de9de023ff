use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use bundle_core::manifest_store;
use bundle_delta::generate::generate_delta;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
struct DeltaOut {
    out: String,
    added: usize,
    updated: usize,
    deleted: usize,
}

/// Generate a delta between two bundle directories' manifests and write the
/// delta manifest, plus the payload files it adds or updates, to `out`.
pub async fn run(from: &PathBuf, to: &PathBuf, out: &PathBuf) -> anyhow::Result<()> {
    let base = manifest_store::parse_manifest(&fs::read(from.join("manifest.json"))?)?;
    let new = manifest_store::parse_manifest(&fs::read(to.join("manifest.json"))?)?;

    let delta = generate_delta(&base, &new, to)?;

    fs::create_dir_all(out).with_context(|| format!("creating {out:?}"))?;
    for op in delta.add.iter().map(|a| &a.path).chain(delta.update.iter().map(|u| &u.path)) {
        let src = op.resolve_within(to)?;
        let dest = op.resolve_within(out)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, &dest).with_context(|| format!("copying {src:?}"))?;
    }

    fs::write(out.join("delta.json"), serde_json::to_vec_pretty(&delta)?)?;

    output::print(&DeltaOut {
        out: out.display().to_string(),
        added: delta.add.len(),
        updated: delta.update.len(),
        deleted: delta.delete.len(),
    })
}
