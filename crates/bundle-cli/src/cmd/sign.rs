use std::fs;
use std::path::PathBuf;

use bundle_core::manifest_store;
use serde::Serialize;

use crate::cmd::create::seal_offline_signature;
use crate::io::keys;
use crate::output;

#[derive(Debug, Serialize)]
struct SignOut {
    bundle: String,
    signature: String,
}

pub async fn run(bundle: &PathBuf, key: &PathBuf) -> anyhow::Result<()> {
    let private = keys::load_signing_key(key)?;

    let manifest_bytes = fs::read(bundle.join("manifest.json"))?;
    let manifest = manifest_store::parse_manifest(&manifest_bytes)?;
    let sealed = manifest_store::seal_manifest(manifest, bundle, Some(&private))?;
    fs::write(bundle.join("manifest.json"), manifest_store::write_manifest(&sealed)?)?;

    seal_offline_signature(bundle, &private)?;

    output::print(&SignOut {
        bundle: bundle.display().to_string(),
        signature: sealed.signature.clone(),
    })
}
