//! Applying a delta (C9, apply half), per spec §4.9: walk the operation list
//! in order, copying content from the staged source tree into the target
//! install, rolling the whole apply back on the first failure.

use std::fs;
use std::path::Path;

use bundle_core::model::{DeltaManifest, Operation};
use bundle_core::ArtifactPath;

use crate::backup::{rollback, BackupManifest};
use crate::errors::{DeltaError, DeltaResult};

/// Apply every operation in `delta`, in list order, copying added/updated
/// content from `source_root` into `target_root`. On any failure, restores
/// `target_root` from `backup` and returns the original error.
pub fn apply_operations(
    delta: &DeltaManifest,
    source_root: &Path,
    target_root: &Path,
    backup: &BackupManifest,
) -> DeltaResult<()> {
    let mut added: Vec<ArtifactPath> = Vec::new();

    let result = (|| -> DeltaResult<()> {
        for op in delta.all_operations() {
            match &op {
                Operation::Add(add) => {
                    copy_into(source_root, target_root, add.path.as_str())?;
                    added.push(add.path.clone());
                }
                Operation::Update(update) => {
                    copy_into(source_root, target_root, update.path.as_str())?;
                }
                Operation::Delete(delete) => {
                    let dest = target_root.join(delete.path.as_str());
                    if dest.exists() {
                        fs::remove_file(&dest)
                            .map_err(|e| DeltaError::Apply(format!("remove {:?}: {e}", delete.path.as_str())))?;
                    }
                }
                Operation::Patch(patch) => {
                    return Err(DeltaError::Apply(format!(
                        "patch operations are not yet applicable: {} ({})",
                        patch.path.as_str(),
                        patch.algorithm
                    )));
                }
            }
        }
        Ok(())
    })();

    if let Err(e) = result {
        rollback(backup, target_root, &added)?;
        return Err(e);
    }

    Ok(())
}

fn copy_into(source_root: &Path, target_root: &Path, rel: &str) -> DeltaResult<()> {
    let source = source_root.join(rel);
    let dest = target_root.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&source, &dest).map_err(|e| DeltaError::Apply(format!("copy {rel:?}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::create_backup;
    use bundle_core::model::{AddOperation, ContentType, DeleteOperation, DeltaDependencies, RollbackDescriptor, UpdateOperation};
    use bundle_core::BundleVersion;
    use tempfile::tempdir;

    fn delta_with(
        add: Vec<AddOperation>,
        update: Vec<UpdateOperation>,
        delete: Vec<DeleteOperation>,
    ) -> DeltaManifest {
        DeltaManifest {
            from_version: BundleVersion::parse("1.0.0").unwrap(),
            to_version: BundleVersion::parse("1.1.0").unwrap(),
            add,
            update,
            delete,
            patch: vec![],
            dependencies: DeltaDependencies::default(),
            rollback: RollbackDescriptor::default(),
        }
    }

    #[test]
    fn apply_adds_updates_and_deletes_in_order() {
        let target = tempdir().unwrap();
        let source = tempdir().unwrap();
        let backup_dir = tempdir().unwrap();

        fs::write(target.path().join("keep.json"), b"old").unwrap();
        fs::write(target.path().join("gone.json"), b"bye").unwrap();
        fs::write(source.path().join("keep.json"), b"new").unwrap();
        fs::write(source.path().join("fresh.json"), b"brand new").unwrap();

        let delta = delta_with(
            vec![AddOperation {
                path: ArtifactPath::new("fresh.json").unwrap(),
                kind: ContentType::Config,
                size: 9,
                hash: "sha256:0".to_string(),
            }],
            vec![UpdateOperation {
                path: ArtifactPath::new("keep.json").unwrap(),
                kind: ContentType::Config,
                old_hash: "sha256:1".to_string(),
                new_hash: "sha256:2".to_string(),
                patch_available: false,
            }],
            vec![DeleteOperation {
                path: ArtifactPath::new("gone.json").unwrap(),
                kind: ContentType::Config,
            }],
        );

        let backup = create_backup(&delta, target.path(), backup_dir.path()).unwrap();
        apply_operations(&delta, source.path(), target.path(), &backup).unwrap();

        assert_eq!(fs::read(target.path().join("keep.json")).unwrap(), b"new");
        assert_eq!(fs::read(target.path().join("fresh.json")).unwrap(), b"brand new");
        assert!(!target.path().join("gone.json").exists());
    }

    #[test]
    fn apply_rolls_back_on_failure_and_restores_original_state() {
        let target = tempdir().unwrap();
        let source = tempdir().unwrap();
        let backup_dir = tempdir().unwrap();

        fs::write(target.path().join("keep.json"), b"old").unwrap();
        fs::write(source.path().join("keep.json"), b"new").unwrap();
        // "missing.json" is referenced by the update op but absent from
        // source_root, so the apply must fail partway through.

        let delta = delta_with(
            vec![AddOperation {
                path: ArtifactPath::new("fresh.json").unwrap(),
                kind: ContentType::Config,
                size: 1,
                hash: "sha256:0".to_string(),
            }],
            vec![UpdateOperation {
                path: ArtifactPath::new("missing.json").unwrap(),
                kind: ContentType::Config,
                old_hash: "sha256:1".to_string(),
                new_hash: "sha256:2".to_string(),
                patch_available: false,
            }],
            vec![],
        );

        let backup = create_backup(&delta, target.path(), backup_dir.path()).unwrap();
        let err = apply_operations(&delta, source.path(), target.path(), &backup);
        assert!(err.is_err());
        assert!(!target.path().join("fresh.json").exists());
        assert_eq!(fs::read(target.path().join("keep.json")).unwrap(), b"old");
    }
}
