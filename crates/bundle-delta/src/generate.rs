//! Delta generation (C9, generation half): builds a [`DeltaManifest`] from
//! two [`BundleManifest`]s, per spec §4.9.
//!
//! Path maps are `BTreeMap`s, so iteration is already in sorted-path order —
//! the same explicit-ordering idiom `bundle_core::determinism::stable_sort`
//! exists to guarantee, applied here directly since the collection being
//! ordered is `ContentItem`, not a generic `T`.

use std::collections::BTreeMap;
use std::path::Path;

use bundle_core::model::{
    AddOperation, BundleManifest, ContentItem, DeleteOperation, DeltaDependencies, DeltaManifest,
    RollbackDescriptor, UpdateOperation,
};

use crate::errors::{DeltaError, DeltaResult};

fn path_map(manifest: &BundleManifest) -> BTreeMap<&str, &ContentItem> {
    manifest.content.iter().map(|item| (item.path.as_str(), item)).collect()
}

/// Diff `base` against `new`, stat'ing added files under `new_root` for
/// their size.
pub fn generate_delta(base: &BundleManifest, new: &BundleManifest, new_root: &Path) -> DeltaResult<DeltaManifest> {
    let base_items = path_map(base);
    let new_items = path_map(new);

    let mut add = Vec::new();
    let mut update = Vec::new();
    for (path, new_item) in &new_items {
        match base_items.get(path) {
            None => {
                let size = std::fs::metadata(new_root.join(path))
                    .map_err(|e| DeltaError::Generation(format!("stat {path:?}: {e}")))?
                    .len();
                add.push(AddOperation {
                    path: new_item.path.clone(),
                    kind: new_item.kind,
                    size,
                    hash: new_item.checksum.as_str().to_string(),
                });
            }
            Some(base_item) => {
                if base_item.checksum != new_item.checksum {
                    update.push(UpdateOperation {
                        path: new_item.path.clone(),
                        kind: new_item.kind,
                        old_hash: base_item.checksum.as_str().to_string(),
                        new_hash: new_item.checksum.as_str().to_string(),
                        patch_available: false,
                    });
                }
            }
        }
    }

    let mut delete = Vec::new();
    for (path, base_item) in &base_items {
        if !new_items.contains_key(path) {
            delete.push(DeleteOperation {
                path: base_item.path.clone(),
                kind: base_item.kind,
            });
        }
    }

    add.sort_by(|a, b| a.path.cmp(&b.path));
    update.sort_by(|a, b| a.path.cmp(&b.path));
    delete.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(DeltaManifest {
        from_version: base.version.clone(),
        to_version: new.version.clone(),
        add,
        update,
        delete,
        patch: Vec::new(),
        dependencies: DeltaDependencies {
            required: vec![base.version.as_str()],
        },
        rollback: RollbackDescriptor::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_core::model::{BundleId, BundleType, Checksums, Compatibility, ContentType};
    use bundle_core::{ArtifactPath, BundleVersion, Sha256Hex};
    use std::fs;
    use tempfile::tempdir;

    fn item(path: &str, kind: ContentType, digest: &str) -> ContentItem {
        ContentItem {
            path: ArtifactPath::new(path).unwrap(),
            kind,
            id: path.to_string(),
            version: None,
            description: None,
            checksum: Sha256Hex::new(digest).unwrap(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            metadata: Default::default(),
        }
    }

    fn manifest(version: &str, content: Vec<ContentItem>) -> BundleManifest {
        BundleManifest {
            schema_version: "1.0".to_string(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            bundle_type: BundleType::Mixed,
            name: "Demo".to_string(),
            description: "Demo bundle".to_string(),
            version: BundleVersion::parse(version).unwrap(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            author: bundle_core::model::Author {
                name: "Test".to_string(),
                email: "test@example.com".to_string(),
                url: None,
                key_id: None,
            },
            content,
            checksums: Checksums::default(),
            compatibility: Compatibility::default(),
            signature: String::new(),
            compliance: None,
            changelog: None,
            documentation: None,
            is_incremental: false,
            base_version: None,
        }
    }

    fn digest(byte: u8) -> String {
        format!("sha256:{}", hex::encode([byte; 32]))
    }

    #[test]
    fn generate_delta_classifies_add_update_delete() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("new.json"), b"new content").unwrap();

        let base = manifest(
            "1.0.0",
            vec![
                item("unchanged.json", ContentType::Config, &digest(1)),
                item("changed.json", ContentType::Config, &digest(2)),
                item("removed.json", ContentType::Config, &digest(3)),
            ],
        );
        let new = manifest(
            "1.1.0",
            vec![
                item("unchanged.json", ContentType::Config, &digest(1)),
                item("changed.json", ContentType::Config, &digest(9)),
                item("new.json", ContentType::Config, &digest(4)),
            ],
        );

        let delta = generate_delta(&base, &new, root.path()).unwrap();
        assert_eq!(delta.add.len(), 1);
        assert_eq!(delta.add[0].path.as_str(), "new.json");
        assert_eq!(delta.update.len(), 1);
        assert_eq!(delta.update[0].path.as_str(), "changed.json");
        assert_eq!(delta.delete.len(), 1);
        assert_eq!(delta.delete[0].path.as_str(), "removed.json");
        assert_eq!(delta.dependencies.required, vec!["1.0.0".to_string()]);
        assert!(delta.rollback.supported);
    }
}
