//! Update planning (C9, planning half): turn a [`DeltaManifest`] into an
//! [`UpdatePlan`] with a size and time estimate, per spec §4.9.

use std::path::Path;

use bundle_core::model::{DeltaManifest, Operation};
use bundle_core::ArtifactPath;

use crate::errors::DeltaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Update,
    Delete,
    Patch,
}

#[derive(Debug, Clone)]
pub struct PlannedOperation {
    pub kind: OpKind,
    pub path: ArtifactPath,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub operations: Vec<PlannedOperation>,
    pub estimated_space_bytes: u64,
    pub estimated_seconds: u64,
}

/// 1 MB/s heuristic, clamped to at least 1 second (spec §4.9).
const BYTES_PER_SECOND: u64 = 1_000_000;

pub fn plan_update(delta: &DeltaManifest, current_root: &Path) -> DeltaResult<UpdatePlan> {
    let mut operations = Vec::new();
    let mut total_bytes: u64 = 0;

    for op in delta.all_operations() {
        let (kind, details) = match &op {
            Operation::Add(add) => {
                total_bytes += add.size;
                (OpKind::Add, format!("add {} bytes, hash {}", add.size, add.hash))
            }
            Operation::Update(update) => {
                let backup_size = std::fs::metadata(current_root.join(update.path.as_str()))
                    .map(|m| m.len())
                    .unwrap_or(0);
                total_bytes += backup_size;
                (
                    OpKind::Update,
                    format!("update {} -> {}", update.old_hash, update.new_hash),
                )
            }
            Operation::Delete(delete) => {
                let backup_size = std::fs::metadata(current_root.join(delete.path.as_str()))
                    .map(|m| m.len())
                    .unwrap_or(0);
                total_bytes += backup_size;
                (OpKind::Delete, "delete, backed up before removal".to_string())
            }
            Operation::Patch(patch) => (
                OpKind::Patch,
                format!("patch via {} using {}", patch.patch_file, patch.algorithm),
            ),
        };
        operations.push(PlannedOperation {
            kind,
            path: op.path().clone(),
            details,
        });
    }

    let estimated_seconds = (total_bytes / BYTES_PER_SECOND).max(1);

    Ok(UpdatePlan {
        operations,
        estimated_space_bytes: total_bytes,
        estimated_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::model::{AddOperation, ContentType, DeleteOperation, DeltaDependencies, RollbackDescriptor, UpdateOperation};
    use bundle_core::BundleVersion;
    use tempfile::tempdir;

    #[test]
    fn plan_sums_sizes_and_clamps_time_to_one_second() {
        let root = tempdir().unwrap();
        let delta = DeltaManifest {
            from_version: BundleVersion::parse("1.0.0").unwrap(),
            to_version: BundleVersion::parse("1.1.0").unwrap(),
            add: vec![AddOperation {
                path: ArtifactPath::new("a.txt").unwrap(),
                kind: ContentType::Resource,
                size: 1024,
                hash: "sha256:0".to_string(),
            }],
            update: vec![],
            delete: vec![],
            patch: vec![],
            dependencies: DeltaDependencies::default(),
            rollback: RollbackDescriptor::default(),
        };
        let plan = plan_update(&delta, root.path()).unwrap();
        assert_eq!(plan.estimated_space_bytes, 1024);
        assert_eq!(plan.estimated_seconds, 1);
        assert_eq!(plan.operations.len(), 1);
    }

    #[test]
    fn plan_preserves_add_then_update_then_delete_order() {
        let root = tempdir().unwrap();
        let delta = DeltaManifest {
            from_version: BundleVersion::parse("1.0.0").unwrap(),
            to_version: BundleVersion::parse("1.1.0").unwrap(),
            add: vec![AddOperation {
                path: ArtifactPath::new("a.txt").unwrap(),
                kind: ContentType::Resource,
                size: 1,
                hash: "sha256:0".to_string(),
            }],
            update: vec![UpdateOperation {
                path: ArtifactPath::new("b.txt").unwrap(),
                kind: ContentType::Resource,
                old_hash: "sha256:1".to_string(),
                new_hash: "sha256:2".to_string(),
                patch_available: false,
            }],
            delete: vec![DeleteOperation {
                path: ArtifactPath::new("c.txt").unwrap(),
                kind: ContentType::Resource,
            }],
            patch: vec![],
            dependencies: DeltaDependencies::default(),
            rollback: RollbackDescriptor::default(),
        };
        let plan = plan_update(&delta, root.path()).unwrap();
        let kinds: Vec<OpKind> = plan.operations.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![OpKind::Add, OpKind::Update, OpKind::Delete]);
    }
}
