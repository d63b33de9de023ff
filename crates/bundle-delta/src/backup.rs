//! Backup and rollback (C9, backup half), per spec §4.9: before an update or
//! delete touches a file, snapshot it so a failed apply can be undone.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use bundle_core::model::{DeltaManifest, Operation};
use bundle_core::prelude::hash_reader;
use bundle_core::ArtifactPath;
use serde::{Deserialize, Serialize};

use crate::errors::{DeltaError, DeltaResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub path: ArtifactPath,
    pub hash: String,
    pub size: u64,
    #[serde(default)]
    pub mode: u32,
    pub backup_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackupManifest {
    pub entries: Vec<BackupEntry>,
}

const MANIFEST_FILE_NAME: &str = "backup-manifest.json";

fn file_mode(path: &Path) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).map(|m| m.permissions().mode() & 0o777).unwrap_or(0o644)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        0o644
    }
}

fn apply_mode(path: &Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
}

/// Snapshot every file touched by an `update` or `delete` operation into
/// `backup_dir`, writing `backup-manifest.json` alongside the copies.
pub fn create_backup(delta: &DeltaManifest, current_root: &Path, backup_dir: &Path) -> DeltaResult<BackupManifest> {
    fs::create_dir_all(backup_dir)?;
    let mut entries = Vec::new();

    for op in delta.all_operations() {
        let needs_backup = matches!(op, Operation::Update(_) | Operation::Delete(_));
        if !needs_backup {
            continue;
        }
        let path = op.path();
        let source = current_root.join(path.as_str());
        if !source.exists() {
            continue;
        }
        let hash = hash_reader(File::open(&source)?).map_err(|e| DeltaError::Backup(e.to_string()))?;
        let size = fs::metadata(&source)?.len();
        let mode = file_mode(&source);

        let backup_path = backup_dir.join(path.as_str());
        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &backup_path)?;

        entries.push(BackupEntry {
            path: path.clone(),
            hash,
            size,
            mode,
            backup_path,
        });
    }

    let manifest = BackupManifest { entries };
    let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(|e| DeltaError::Backup(e.to_string()))?;
    fs::write(backup_dir.join(MANIFEST_FILE_NAME), manifest_json)?;
    Ok(manifest)
}

/// Restore every backed-up file to `target_root`, then remove any path that
/// was newly added by the failed apply.
pub fn rollback(backup: &BackupManifest, target_root: &Path, added: &[ArtifactPath]) -> DeltaResult<()> {
    for entry in &backup.entries {
        let dest = target_root.join(entry.path.as_str());
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&entry.backup_path, &dest)
            .map_err(|e| DeltaError::Rollback(format!("restore {:?}: {e}", entry.path.as_str())))?;
        apply_mode(&dest, entry.mode);
    }

    for path in added {
        let added_path = target_root.join(path.as_str());
        if added_path.exists() {
            fs::remove_file(&added_path).map_err(|e| DeltaError::Rollback(format!("remove {path:?}: {e}")))?;
        }
    }

    Ok(())
}
