use std::path::{Path, PathBuf};

use bundle_core::Context;
use bundle_import::importer::{ImportOptions, StagedImporter, ValidationLevel};
use bundle_import::phases::CancellationToken;
use bundle_import::progress::NullProgressSink;
use bundle_policy::compat::{CompatibilityConfig, DetectedEnvironment, Overrides};
use bundle_policy::schema::default_schema;

use crate::errors::CliError;
use crate::io::keys;
use crate::output;

pub async fn run(
    archive: &PathBuf,
    target: &PathBuf,
    pubkey: &Path,
    backup: Option<&Path>,
    force: bool,
    validation_level: &str,
    encrypted: bool,
) -> anyhow::Result<()> {
    let public_key = keys::load_public_key(pubkey)?;
    let validation_level = parse_validation_level(validation_level)?;
    let decrypt_password = if encrypted {
        Some(std::env::var("BUNDLE_PASSWORD").map_err(|_| {
            CliError::InvalidArgs("BUNDLE_PASSWORD must be set to import an encrypted archive".to_string())
        })?)
    } else {
        None
    };

    let options = ImportOptions {
        target: target.clone(),
        backup_dir: backup.map(Path::to_path_buf),
        force,
        keep_backup: true,
        validation_level,
        public_key,
        structure_schema: default_schema(),
        compatibility_config: CompatibilityConfig::default(),
        environment: local_environment(),
        overrides: Overrides::default(),
        error_report_path: None,
        decrypt_password,
    };

    std::fs::create_dir_all(target)?;
    let ctx = Context::new(target);
    let report = StagedImporter::new().import(&ctx, archive, &options, &NullProgressSink, &CancellationToken::new())?;

    if !report.success {
        let blocked_by_conflict = report.errors.iter().any(|e| e.contains("conflicting file"));
        output::print(&report)?;
        return Err(if blocked_by_conflict {
            CliError::ImportBlocked(report.message).into()
        } else {
            CliError::VerificationFailed(report.message).into()
        });
    }

    output::print(&report)
}

fn parse_validation_level(raw: &str) -> anyhow::Result<ValidationLevel> {
    match raw {
        "basic" => Ok(ValidationLevel::Basic),
        "standard" => Ok(ValidationLevel::Standard),
        "strict" => Ok(ValidationLevel::Strict),
        other => Err(CliError::InvalidArgs(format!("unknown validation level: {other}")).into()),
    }
}

/// A conservative stand-in for a real hardware probe: reports the running
/// OS/arch and treats disk/memory as unconstrained, so `CompatibilityGate`'s
/// disk/memory checks only fire when a bundle's compatibility section
/// names requirements the caller chooses to enforce via `--validation-level
/// strict` on a constrained `CompatibilityConfig`.
fn local_environment() -> DetectedEnvironment {
    DetectedEnvironment {
        environment: "production".to_string(),
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        available_disk_bytes: u64::MAX,
        available_memory_bytes: u64::MAX,
        available_components: Vec::new(),
    }
}
