use std::path::Path;

use anyhow::Result;
use bundle_policy::schema::default_schema;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorOut {
    pub ok: bool,
    pub checks: Vec<Check>,
}

/// Self-checks a bundle root (or the current directory, if none is given):
/// is there a readable manifest, key material next to it, and does the
/// default structure schema at least parse. Does not touch the network.
pub async fn run(store_root: Option<&Path>) -> Result<()> {
    let root = store_root.map(Path::to_path_buf).unwrap_or_else(|| Path::new(".").to_path_buf());
    let mut checks = Vec::new();

    let manifest_path = root.join("manifest.json");
    checks.push(Check {
        name: "manifest".to_string(),
        ok: manifest_path.is_file(),
        detail: format!("{}", manifest_path.display()),
    });

    let public_key_path = root.join("signatures/public-key.pem");
    checks.push(Check {
        name: "public-key".to_string(),
        ok: public_key_path.is_file(),
        detail: format!("{}", public_key_path.display()),
    });

    let bundle_sig_path = root.join("signatures/bundle.sig");
    checks.push(Check {
        name: "offline-signature".to_string(),
        ok: bundle_sig_path.is_file(),
        detail: "optional: inline manifest.signature also accepted".to_string(),
    });

    let schema = default_schema();
    checks.push(Check {
        name: "structure-schema".to_string(),
        ok: !schema.entries.is_empty(),
        detail: format!("{} required/optional directories known", schema.entries.len()),
    });

    let ok = checks.iter().filter(|c| c.name != "offline-signature").all(|c| c.ok);
    output::print(&DoctorOut { ok, checks })?;
    Ok(())
}
