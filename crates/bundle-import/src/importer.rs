//! `StagedImporter` (C11): the six-phase state machine from spec §4.11,
//! adapted from `signia-core::pipeline`'s `PipelineContext`/diagnostics
//! shape to a fixed sequence of phases instead of a configurable stage
//! list, since the import protocol's phases (and their rollback contract)
//! are not pluggable.

use std::path::{Path, PathBuf};

use bundle_archive::format::ArchiveFormat;
use bundle_codec::aead::{aead_for, AeadKind};
use bundle_codec::header::EncryptedHeader;
use bundle_core::context::AuditEvent;
use bundle_core::manifest_store;
use bundle_core::model::BundleManifest;
use bundle_core::Context;
use bundle_delta::backup::{create_backup, rollback, BackupManifest};
use bundle_policy::compat::{CompatibilityConfig, CompatibilityGate, DetectedEnvironment, Overrides};
use bundle_policy::schema::{validate_structure, IssueSeverity, StructureSchema};
use ed25519_dalek::VerifyingKey;

use crate::errors::{ImportError, ImportResult};
use crate::phases::{CancellationToken, ImportState, Phase};
use crate::progress::{ImportEvent, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Basic,
    Standard,
    Strict,
}

pub struct ImportOptions {
    pub target: PathBuf,
    pub backup_dir: Option<PathBuf>,
    pub force: bool,
    pub keep_backup: bool,
    pub validation_level: ValidationLevel,
    pub public_key: VerifyingKey,
    pub structure_schema: StructureSchema,
    pub compatibility_config: CompatibilityConfig,
    pub environment: DetectedEnvironment,
    pub overrides: Overrides,
    pub error_report_path: Option<PathBuf>,
    /// Required when `archive` is an encrypted archive (spec §6): the
    /// 256-byte `LLMR-ENC` header names the AEAD algorithm, so only the
    /// password needs to be supplied here.
    pub decrypt_password: Option<String>,
}

/// The importer's failure contract, per spec §7: on failure the importer
/// returns a result carrying this shape rather than hiding the partial
/// state behind an opaque error.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub error_report_path: Option<PathBuf>,
    pub partial_imported_items: Vec<String>,
    pub backup_path: Option<PathBuf>,
}

impl ImportReport {
    fn success(message: impl Into<String>, backup_path: Option<PathBuf>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            error_report_path: None,
            partial_imported_items: Vec::new(),
            backup_path,
        }
    }
}

#[derive(Default)]
pub struct StagedImporter;

impl StagedImporter {
    pub fn new() -> Self {
        Self
    }

    /// Run the full import. `archive` must be an already-downloaded archive
    /// file; no network access is performed.
    pub fn import(
        &self,
        ctx: &Context,
        archive: &Path,
        options: &ImportOptions,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> ImportResult<ImportReport> {
        let mut state = ImportState::Idle;
        let mut warnings: Vec<String> = Vec::new();
        let mut added: Vec<bundle_core::ArtifactPath> = Vec::new();
        let mut backup: Option<BackupManifest> = None;
        let bundle_id_hint = archive.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string());

        self.audit(ctx, "import_started", &bundle_id_hint, "ok", serde_json::json!({}));

        let (plaintext_archive, _decrypted_guard) =
            match materialize_plaintext_archive(archive, options.decrypt_password.as_deref()) {
                Ok(pair) => pair,
                Err(e) => {
                    self.audit(ctx, "validation_failed", &bundle_id_hint, "error", serde_json::json!({"error": e.to_string()}));
                    return Ok(ImportReport {
                        success: false,
                        message: e.to_string(),
                        errors: vec![e.to_string()],
                        warnings,
                        error_report_path: options.error_report_path.clone(),
                        partial_imported_items: Vec::new(),
                        backup_path: options.backup_dir.clone(),
                    });
                }
            };
        let archive = plaintext_archive.as_path();

        let outcome = (|| -> ImportResult<(BundleManifest, PathBuf)> {
            // --- Validation ---
            state = ImportState::Validating;
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            progress.on_event(ImportEvent::info(Phase::Validation, 0, "validation.started", "validating archive"));
            self.audit(ctx, "validation_started", &bundle_id_hint, "ok", serde_json::json!({}));
            let manifest = self.validate(archive, options).map_err(|e| {
                self.audit(ctx, "validation_failed", &bundle_id_hint, "error", serde_json::json!({"error": e.to_string()}));
                e
            })?;
            self.audit(
                ctx,
                "validation_completed",
                &Some(manifest.bundle_id.as_str().to_string()),
                "ok",
                serde_json::json!({}),
            );
            progress.on_event(ImportEvent::info(Phase::Validation, 100, "validation.completed", "validation passed"));

            // --- Extraction ---
            state = ImportState::Extracting;
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            let temp_dir = tempfile::tempdir().map_err(ImportError::from)?;
            let temp_path = temp_dir.into_path();
            let format = ArchiveFormat::detect(archive).map_err(|e| ImportError::Extraction(e.to_string()))?;
            bundle_archive::archiver_for(format)
                .extract_archive(archive, &temp_path)
                .map_err(|e| {
                    self.audit(ctx, "extraction_failed", &bundle_id_hint, "error", serde_json::json!({"error": e.to_string()}));
                    ImportError::Extraction(e.to_string())
                })?;
            progress.on_event(ImportEvent::info(Phase::Extraction, 100, "extraction.completed", "archive extracted"));

            // --- Backup ---
            state = ImportState::BackingUp;
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            self.audit(ctx, "backup_started", &bundle_id_hint, "ok", serde_json::json!({}));
            match &options.backup_dir {
                Some(dir) => {
                    let synthetic = synthetic_backup_delta(&manifest, &options.target);
                    let manifest_backup = create_backup(&synthetic, &options.target, dir).map_err(ImportError::from)?;
                    self.audit(ctx, "backup_created", &bundle_id_hint, "ok", serde_json::json!({"path": dir.display().to_string()}));
                    backup = Some(manifest_backup);
                }
                None => {
                    warnings.push("no backup directory supplied; rollback is unavailable".to_string());
                }
            }
            progress.on_event(ImportEvent::info(Phase::Backup, 100, "backup.completed", "backup complete"));

            // --- Verification ---
            state = ImportState::Verifying;
            if cancel.is_cancelled() {
                return Err(ImportError::Cancelled);
            }
            self.audit(ctx, "conflict_check_started", &bundle_id_hint, "ok", serde_json::json!({}));
            let conflicts = detect_conflicts(&manifest, &options.target);
            if !conflicts.is_empty() && !options.force {
                self.audit(
                    ctx,
                    "conflict_check_completed",
                    &bundle_id_hint,
                    "blocked",
                    serde_json::json!({"conflicts": conflicts.len()}),
                );
                return Err(ImportError::Conflict(format!("{} conflicting file(s); rerun with force to overwrite", conflicts.len())));
            }
            self.audit(ctx, "conflict_check_completed", &bundle_id_hint, "ok", serde_json::json!({"conflicts": conflicts.len()}));
            progress.on_event(ImportEvent::info(Phase::Verification, 100, "verification.completed", "no blocking conflicts"));

            // --- Installation ---
            state = ImportState::Installing;
            for (i, item) in manifest.content.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Err(ImportError::Cancelled);
                }
                let source = item.path.resolve_within(&temp_path).map_err(ImportError::from)?;
                let dest = item.path.resolve_within(&options.target).map_err(ImportError::from)?;
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(&source, &dest).map_err(|e| {
                    ImportError::Installation(format!("copying {:?}: {e}", item.path.as_str()))
                })?;
                added.push(item.path.clone());
                self.audit(ctx, "file_installed", &bundle_id_hint, "ok", serde_json::json!({"path": item.path.as_str()}));
                let percent = (((i + 1) * 100) / manifest.content.len().max(1)) as u8;
                progress.on_event(ImportEvent::info(Phase::Installation, percent, "installation.progress", item.path.as_str()));
            }

            // --- Cleanup ---
            state = ImportState::Cleaning;
            let _ = std::fs::remove_dir_all(&temp_path);
            if let (Some(dir), false) = (&options.backup_dir, options.keep_backup) {
                let _ = std::fs::remove_dir_all(dir);
            }
            progress.on_event(ImportEvent::info(Phase::Cleanup, 100, "cleanup.completed", "temp directory removed"));

            Ok((manifest, temp_path))
        })();

        match outcome {
            Ok((manifest, _temp_path)) => {
                state = ImportState::Succeeded;
                tracing::debug!(state = ?state, "import finished");
                self.audit(
                    ctx,
                    "import_completed",
                    &Some(manifest.bundle_id.as_str().to_string()),
                    "ok",
                    serde_json::json!({}),
                );
                self.audit(ctx, "import_summary", &Some(manifest.bundle_id.as_str().to_string()), "ok", serde_json::json!({"installed": added.len()}));
                let mut report = ImportReport::success("import completed", options.backup_dir.clone());
                report.warnings = warnings;
                report.partial_imported_items = added.iter().map(|p| p.as_str().to_string()).collect();
                Ok(report)
            }
            Err(e) => {
                let installation_began = matches!(state, ImportState::Installing | ImportState::Cleaning);
                if installation_began {
                    if let Some(backup) = &backup {
                        state = ImportState::RollingBack;
                        rollback(backup, &options.target, &added).map_err(|re| {
                            let fatal = ImportError::Rollback(re.to_string());
                            self.audit(ctx, "import_failed", &bundle_id_hint, "rollback_failed", serde_json::json!({"error": re.to_string()}));
                            fatal
                        })?;
                        self.audit(ctx, "rollback_completed", &bundle_id_hint, "ok", serde_json::json!({"restored": added.len()}));
                    }
                }
                state = if matches!(e, ImportError::Cancelled) { ImportState::Cancelled } else { ImportState::Failed };
                self.audit(ctx, "import_completed", &bundle_id_hint, "failed", serde_json::json!({"error": e.to_string()}));

                let error_report_path = options.error_report_path.clone();
                if let Some(path) = &error_report_path {
                    let report_body = serde_json::json!({
                        "error": e.to_string(),
                        "partial_imported_items": added.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                    });
                    let _ = std::fs::write(path, serde_json::to_vec_pretty(&report_body).unwrap_or_default());
                }

                Ok(ImportReport {
                    success: false,
                    message: e.to_string(),
                    errors: vec![e.to_string()],
                    warnings,
                    error_report_path,
                    partial_imported_items: added.iter().map(|p| p.as_str().to_string()).collect(),
                    backup_path: options.backup_dir.clone(),
                })
            }
        }
    }

    /// Validation phase body: parse the manifest, verify structure,
    /// signature, checksums, and compatibility. The archiver has no
    /// partial-read mode, so this extracts into a throwaway scratch
    /// directory rather than the working temp directory Extraction later
    /// produces — recorded as an Open Question in `DESIGN.md`.
    fn validate(&self, archive: &Path, options: &ImportOptions) -> ImportResult<BundleManifest> {
        let scratch = tempfile::tempdir().map_err(ImportError::from)?;
        let format = ArchiveFormat::detect(archive).map_err(|e| ImportError::Validation(e.to_string()))?;
        bundle_archive::archiver_for(format)
            .extract_archive(archive, scratch.path())
            .map_err(|e| ImportError::Validation(format!("unpacking for validation: {e}")))?;

        let manifest_bytes = std::fs::read(scratch.path().join("manifest.json"))
            .map_err(|e| ImportError::Validation(format!("reading manifest.json: {e}")))?;
        let manifest = manifest_store::parse_manifest(&manifest_bytes).map_err(|e| ImportError::Validation(e.to_string()))?;

        if matches!(options.validation_level, ValidationLevel::Standard | ValidationLevel::Strict) {
            let issues = validate_structure(&options.structure_schema, scratch.path()).map_err(|e| ImportError::Validation(e.to_string()))?;
            let fatal: Vec<_> = issues.iter().filter(|i| i.severity == IssueSeverity::Fatal).collect();
            if !fatal.is_empty() {
                return Err(ImportError::Validation(format!("structure validation failed: {} fatal issue(s)", fatal.len())));
            }
        }

        manifest_store::verify_content_checksums(&manifest, scratch.path()).map_err(|e| ImportError::Validation(e.to_string()))?;
        manifest_store::verify_manifest_integrity(&manifest, &options.public_key).map_err(|e| ImportError::Validation(e.to_string()))?;

        if options.validation_level == ValidationLevel::Strict {
            let current = manifest.version.clone();
            let gate = CompatibilityGate;
            let result = gate.evaluate(&current, &manifest.version, &options.environment, &options.compatibility_config, &options.overrides);
            if !result.compatible {
                return Err(ImportError::Validation(format!("{} blocking compatibility issue(s)", result.issues.len())));
            }
        }

        Ok(manifest)
    }

    fn audit(&self, ctx: &Context, event: &str, bundle_id: &Option<String>, status: &str, details: serde_json::Value) {
        ctx.audit(AuditEvent {
            timestamp: ctx.now().to_string(),
            event: event.to_string(),
            component: "bundle-import".to_string(),
            bundle_id: bundle_id.clone(),
            user: None,
            status: status.to_string(),
            details,
        });
    }
}

/// If `archive` starts with the `LLMR-ENC` magic, decrypt it with
/// `password` into a scratch file and return that path; otherwise return
/// `archive` unchanged. The returned `TempDir` (when present) must outlive
/// every use of the returned path.
fn materialize_plaintext_archive(archive: &Path, password: Option<&str>) -> ImportResult<(PathBuf, Option<tempfile::TempDir>)> {
    let mut file = std::fs::File::open(archive)?;
    let mut magic_probe = [0u8; 8];
    use std::io::Read;
    let read = file.read(&mut magic_probe)?;
    if read < 8 || &magic_probe != bundle_codec::header::MAGIC {
        return Ok((archive.to_path_buf(), None));
    }

    let password = password.ok_or_else(|| {
        ImportError::Validation("archive is encrypted but no password was supplied".to_string())
    })?;

    let mut full = Vec::new();
    std::fs::File::open(archive)?.read_to_end(&mut full)?;
    let mut cursor = std::io::Cursor::new(&full[..]);
    let header = EncryptedHeader::read_from(&mut cursor).map_err(|e| ImportError::Validation(e.to_string()))?;
    let sealed = &full[header.header_size as usize..];
    let kind = AeadKind::parse(&header.algorithm).map_err(|e| ImportError::Validation(e.to_string()))?;
    let plaintext = aead_for(kind)
        .open(sealed, password.as_bytes())
        .map_err(|e| ImportError::Validation(format!("decrypting archive: {e}")))?;

    let dir = tempfile::tempdir().map_err(ImportError::from)?;
    let out_path = dir.path().join("decrypted.archive");
    std::fs::write(&out_path, plaintext)?;
    Ok((out_path, Some(dir)))
}

/// For every content item whose destination already exists in `target`,
/// synthesize an `update` operation so `bundle_delta::backup::create_backup`
/// snapshots it before Installation overwrites it. Items with no existing
/// destination need no backup entry.
fn synthetic_backup_delta(manifest: &BundleManifest, target: &Path) -> bundle_core::model::DeltaManifest {
    let mut update = Vec::new();
    for item in &manifest.content {
        let dest = target.join(item.path.as_str());
        if dest.exists() {
            update.push(bundle_core::model::UpdateOperation {
                path: item.path.clone(),
                kind: item.kind,
                old_hash: String::new(),
                new_hash: item.checksum.as_str().to_string(),
                patch_available: false,
            });
        }
    }
    bundle_core::model::DeltaManifest {
        from_version: manifest.version.clone(),
        to_version: manifest.version.clone(),
        add: Vec::new(),
        update,
        delete: Vec::new(),
        patch: Vec::new(),
        dependencies: bundle_core::model::DeltaDependencies::default(),
        rollback: bundle_core::model::RollbackDescriptor::default(),
    }
}

fn detect_conflicts(manifest: &BundleManifest, target: &Path) -> Vec<bundle_delta::conflict::Conflict> {
    manifest
        .content
        .iter()
        .filter_map(|item| {
            let dest = target.join(item.path.as_str());
            if dest.exists() {
                Some(bundle_delta::conflict::Conflict {
                    kind: bundle_delta::conflict::ConflictKind::FileExists,
                    path: item.path.clone(),
                    detail: format!("{} already exists at the install target", item.path.as_str()),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_archive::archiver_for;
    use bundle_core::model::{Author, BundleId, BundleType, Checksums, Compatibility, ContentItem, ContentType};
    use bundle_core::{ArtifactPath, BundleVersion, Sha256Hex};
    use bundle_policy::schema::default_schema;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn build_signed_archive(bundle_root: &std::path::Path, archive_path: &std::path::Path) -> (BundleManifest, VerifyingKey) {
        fs::create_dir_all(bundle_root.join("templates")).unwrap();
        fs::write(bundle_root.join("templates/hello.json"), b"{\"id\":\"t1\"}").unwrap();

        let digest = bundle_core::prelude::hash_bytes(b"{\"id\":\"t1\"}");
        let item = ContentItem {
            path: ArtifactPath::new("templates/hello.json").unwrap(),
            kind: ContentType::Template,
            id: "t1".to_string(),
            version: Some("1.0.0".to_string()),
            description: None,
            checksum: Sha256Hex::new(digest).unwrap(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            metadata: BTreeMap::new(),
        };
        let manifest = BundleManifest {
            schema_version: "1.0".to_string(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            bundle_type: BundleType::Templates,
            name: "Demo".to_string(),
            description: "Demo bundle".to_string(),
            version: BundleVersion::parse("1.0.0").unwrap(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            author: Author { name: "Test".to_string(), email: "t@example.com".to_string(), url: None, key_id: None },
            content: vec![item],
            checksums: Checksums::default(),
            compatibility: Compatibility::default(),
            signature: String::new(),
            compliance: None,
            changelog: None,
            documentation: None,
            is_incremental: false,
            base_version: None,
        };

        let (public, private) = bundle_core::sign::generate_keypair();
        let sealed = manifest_store::seal_manifest(manifest, bundle_root, Some(&private)).unwrap();
        let manifest_bytes = manifest_store::write_manifest(&sealed).unwrap();
        fs::write(bundle_root.join("manifest.json"), manifest_bytes).unwrap();

        let entries = vec![
            ArtifactPath::new("manifest.json").unwrap(),
            ArtifactPath::new("templates/hello.json").unwrap(),
        ];
        archiver_for(ArchiveFormat::Tar).write_archive(bundle_root, &entries, archive_path).unwrap();

        (sealed, public)
    }

    fn base_options(target: std::path::PathBuf, backup_dir: Option<std::path::PathBuf>, public_key: VerifyingKey, force: bool) -> ImportOptions {
        ImportOptions {
            target,
            backup_dir,
            force,
            keep_backup: true,
            validation_level: ValidationLevel::Basic,
            public_key,
            structure_schema: default_schema(),
            compatibility_config: CompatibilityConfig::default(),
            environment: DetectedEnvironment {
                environment: "test".to_string(),
                os: "linux".to_string(),
                arch: "x86_64".to_string(),
                available_disk_bytes: u64::MAX,
                available_memory_bytes: u64::MAX,
                available_components: Vec::new(),
            },
            overrides: Overrides::default(),
            error_report_path: None,
            decrypt_password: None,
        }
    }

    #[test]
    fn staged_import_installs_content_into_target() {
        let bundle_root = tempdir().unwrap();
        let archive_path = tempdir().unwrap().path().join("bundle.tar");
        let (_manifest, public) = build_signed_archive(bundle_root.path(), &archive_path);

        let target = tempdir().unwrap();
        let backup = tempdir().unwrap();
        let options = base_options(target.path().to_path_buf(), Some(backup.path().to_path_buf()), public, false);

        let ctx = Context::new(target.path());
        let report = StagedImporter::new()
            .import(&ctx, &archive_path, &options, &NullProgressSink, &CancellationToken::new())
            .unwrap();

        assert!(report.success, "import failed: {:?}", report.errors);
        assert_eq!(fs::read(target.path().join("templates/hello.json")).unwrap(), b"{\"id\":\"t1\"}");
    }

    #[test]
    fn staged_import_blocks_on_conflict_without_force() {
        let bundle_root = tempdir().unwrap();
        let archive_path = tempdir().unwrap().path().join("bundle.tar");
        let (_manifest, public) = build_signed_archive(bundle_root.path(), &archive_path);

        let target = tempdir().unwrap();
        fs::create_dir_all(target.path().join("templates")).unwrap();
        fs::write(target.path().join("templates/hello.json"), b"pre-existing").unwrap();

        let options = base_options(target.path().to_path_buf(), None, public, false);
        let ctx = Context::new(target.path());
        let report = StagedImporter::new()
            .import(&ctx, &archive_path, &options, &NullProgressSink, &CancellationToken::new())
            .unwrap();

        assert!(!report.success);
        assert_eq!(fs::read(target.path().join("templates/hello.json")).unwrap(), b"pre-existing");
    }

    #[test]
    fn staged_import_with_force_overwrites_existing_file_and_keeps_a_backup() {
        let bundle_root = tempdir().unwrap();
        let archive_path = tempdir().unwrap().path().join("bundle.tar");
        let (_manifest, public) = build_signed_archive(bundle_root.path(), &archive_path);

        let target = tempdir().unwrap();
        fs::create_dir_all(target.path().join("templates")).unwrap();
        fs::write(target.path().join("templates/hello.json"), b"pre-existing").unwrap();

        let backup = tempdir().unwrap();
        let options = base_options(target.path().to_path_buf(), Some(backup.path().to_path_buf()), public, true);
        let ctx = Context::new(target.path());
        let report = StagedImporter::new()
            .import(&ctx, &archive_path, &options, &NullProgressSink, &CancellationToken::new())
            .unwrap();

        assert!(report.success, "import failed: {:?}", report.errors);
        assert_eq!(fs::read(target.path().join("templates/hello.json")).unwrap(), b"{\"id\":\"t1\"}");
        assert_eq!(fs::read(backup.path().join("templates/hello.json")).unwrap(), b"pre-existing");
    }
}
