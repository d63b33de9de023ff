//! The bundle/content/delta data model.
//!
//! Plain data plus `serde` derives and free validation functions that return
//! `BundleResult<()>`, following `signia-core::model::validate::schema_v1_basic`'s
//! shape: validation is a function over the data, not a method that also
//! performs I/O. Cyclic-looking references (each `ContentItem` carries the
//! owning `bundle_id`) collapse into "items borrow the id, they do not own
//! it" — there is exactly one authoritative `BundleManifest` per bundle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BundleError, BundleResult};
use crate::hash::Sha256Hex;
use crate::path::ArtifactPath;
use crate::version::BundleVersion;

/// A validated bundle identifier: lowercase ASCII alphanumerics, `-`, `.`,
/// 1 to 128 bytes. Mirrors the `PluginId`-style newtype-with-validation
/// pattern `signia-core` uses for its own opaque identifiers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(String);

impl BundleId {
    pub fn new(raw: impl Into<String>) -> BundleResult<Self> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > 128 {
            return Err(BundleError::validation(format!(
                "bundle_id must be 1-128 bytes, got {} bytes",
                raw.len()
            )));
        }
        let valid = raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
        if !valid {
            return Err(BundleError::validation(format!(
                "bundle_id contains invalid characters: {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three content categories a bundle may ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    Templates,
    Modules,
    Mixed,
}

/// The four content-item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Template,
    Module,
    Config,
    Resource,
}

/// One file enumerated in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub path: ArtifactPath,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub checksum: Sha256Hex,
    pub bundle_id: BundleId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// `BundleManifest.author`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// `BundleManifest.checksums`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    /// Self-hash of the manifest with `signature` and this field cleared.
    /// Empty until sealed (see [`crate::manifest_store`]).
    #[serde(default)]
    pub manifest: String,
    /// path -> `sha256:<hex>` of the raw file bytes.
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

/// `BundleManifest.compatibility`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub min_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible: Vec<String>,
}

/// One changelog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub date: String,
    pub changes: Vec<String>,
}

/// Compliance mapping: category/control -> set of content-ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compliance {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub owasp_llm_top10: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub iso_iec_42001: BTreeMap<String, Vec<String>>,
}

/// The top-level bundle manifest. Immutable once signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub schema_version: String,
    pub bundle_id: BundleId,
    pub bundle_type: BundleType,
    pub name: String,
    pub description: String,
    pub version: BundleVersion,
    pub created_at: String,
    pub author: Author,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub checksums: Checksums,
    #[serde(default)]
    pub compatibility: Compatibility,
    /// Base64 Ed25519 signature; empty string while hashing/signing input
    /// is being computed.
    #[serde(default)]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Compliance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Vec<ChangelogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_incremental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_version: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Validate the six invariants from the data model specification, except
/// checksum/hash recomputation which `manifest_store` performs (it needs
/// filesystem access this module intentionally does not have).
pub fn validate_manifest(manifest: &BundleManifest) -> BundleResult<()> {
    validate_unique_content_ids(manifest)?;
    validate_incremental_flag(manifest)?;
    validate_compliance_refs(manifest)?;
    validate_content_paths(manifest)?;
    Ok(())
}

/// Invariant 5: `content[*].id` is unique within the bundle.
fn validate_unique_content_ids(manifest: &BundleManifest) -> BundleResult<()> {
    let mut seen = std::collections::HashSet::new();
    for item in &manifest.content {
        if !seen.insert(item.id.as_str()) {
            return Err(BundleError::validation(format!(
                "duplicate content id: {}",
                item.id
            )));
        }
    }
    Ok(())
}

/// Invariant 3: incremental bundles must set `base_version != version`;
/// non-incremental bundles must leave `base_version` empty.
fn validate_incremental_flag(manifest: &BundleManifest) -> BundleResult<()> {
    match (&manifest.is_incremental, &manifest.base_version) {
        (true, None) => Err(BundleError::validation(
            "incremental bundle must declare base_version",
        )),
        (true, Some(base)) if base.as_str() == manifest.version.as_str() => Err(BundleError::validation(
            "incremental bundle base_version must differ from version",
        )),
        (false, Some(_)) => Err(BundleError::validation(
            "non-incremental bundle must not declare base_version",
        )),
        _ => Ok(()),
    }
}

/// Invariant 4: every content-id named in a compliance mapping exists in
/// `content`.
fn validate_compliance_refs(manifest: &BundleManifest) -> BundleResult<()> {
    let Some(compliance) = &manifest.compliance else {
        return Ok(());
    };
    let known: std::collections::HashSet<&str> =
        manifest.content.iter().map(|c| c.id.as_str()).collect();
    for (category, ids) in compliance
        .owasp_llm_top10
        .iter()
        .chain(compliance.iso_iec_42001.iter())
    {
        for id in ids {
            if !known.contains(id.as_str()) {
                return Err(BundleError::validation(format!(
                    "compliance category {category:?} references unknown content id {id:?}"
                )));
            }
        }
    }
    Ok(())
}

/// Every `ContentItem.path` must already be a validated [`ArtifactPath`];
/// this function additionally rejects duplicate paths, which would make
/// the checksum map and the content list disagree.
fn validate_content_paths(manifest: &BundleManifest) -> BundleResult<()> {
    let mut seen = std::collections::HashSet::new();
    for item in &manifest.content {
        if !seen.insert(item.path.as_str()) {
            return Err(BundleError::validation(format!(
                "duplicate content path: {}",
                item.path
            )));
        }
    }
    Ok(())
}

/// `signatures/bundle.sig`: the offline signature envelope, authoritative
/// over `BundleManifest.signature` when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    pub version: u32,
    pub algorithm: String,
    pub key_id: String,
    pub timestamp: String,
    pub content_hash: String,
    pub signature: String,
    #[serde(default)]
    pub metadata: SignatureMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// One entry in the sorted file-hash manifest (`signatures/manifest.json`)
/// that the offline signature envelope's `content_hash` is computed over.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileHashEntry {
    pub path: String,
    pub hash: String,
    pub size: u64,
    pub mode: u32,
}

/// `add` operation in a [`DeltaManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOperation {
    pub path: ArtifactPath,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub size: u64,
    pub hash: String,
}

/// `update` operation in a [`DeltaManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOperation {
    pub path: ArtifactPath,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub old_hash: String,
    pub new_hash: String,
    pub patch_available: bool,
}

/// `delete` operation in a [`DeltaManifest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOperation {
    pub path: ArtifactPath,
    #[serde(rename = "type")]
    pub kind: ContentType,
}

/// `patch` operation in a [`DeltaManifest`]. Reserved per Design Note Open
/// Question 1: generators may leave this list empty; consumers must accept
/// that and reject a non-empty list with a clear "unsupported" error rather
/// than attempting to apply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOperation {
    pub path: ArtifactPath,
    pub patch_file: String,
    pub algorithm: String,
}

/// A borrowed view over one of the four typed operation lists, used by
/// `bundle-delta` when it needs to iterate operations generically (for
/// example to walk them in manifest-declared order without caring which
/// list they came from).
#[derive(Debug, Clone)]
pub enum Operation<'a> {
    Add(&'a AddOperation),
    Update(&'a UpdateOperation),
    Delete(&'a DeleteOperation),
    Patch(&'a PatchOperation),
}

impl<'a> Operation<'a> {
    pub fn path(&self) -> &'a ArtifactPath {
        match self {
            Operation::Add(op) => &op.path,
            Operation::Update(op) => &op.path,
            Operation::Delete(op) => &op.path,
            Operation::Patch(op) => &op.path,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaDependencies {
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackDescriptor {
    pub supported: bool,
    pub snapshot_required: bool,
}

impl Default for RollbackDescriptor {
    fn default() -> Self {
        Self {
            supported: true,
            snapshot_required: true,
        }
    }
}

/// `delta-manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeltaManifest {
    pub from_version: BundleVersion,
    pub to_version: BundleVersion,
    #[serde(default)]
    pub add: Vec<AddOperation>,
    #[serde(default)]
    pub update: Vec<UpdateOperation>,
    #[serde(default)]
    pub delete: Vec<DeleteOperation>,
    #[serde(default)]
    pub patch: Vec<PatchOperation>,
    #[serde(default)]
    pub dependencies: DeltaDependencies,
    #[serde(default)]
    pub rollback: RollbackDescriptor,
}

impl DeltaManifest {
    /// All operations across the four lists, in the manifest's declared
    /// order: add, then update, then delete, then patch. `bundle-delta`'s
    /// planner consumes this ordering verbatim; per spec §5 the engine
    /// never reorders.
    pub fn all_operations(&self) -> Vec<Operation<'_>> {
        let mut ops = Vec::with_capacity(
            self.add.len() + self.update.len() + self.delete.len() + self.patch.len(),
        );
        ops.extend(self.add.iter().map(Operation::Add));
        ops.extend(self.update.iter().map(Operation::Update));
        ops.extend(self.delete.iter().map(Operation::Delete));
        ops.extend(self.patch.iter().map(Operation::Patch));
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(id: &str, path: &str) -> ContentItem {
        ContentItem {
            path: ArtifactPath::new(path).unwrap(),
            kind: ContentType::Template,
            id: id.to_string(),
            version: Some("1.0.0".to_string()),
            description: None,
            checksum: Sha256Hex::new(crate::hash::hash_bytes(b"x")).unwrap(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            metadata: BTreeMap::new(),
        }
    }

    fn sample_manifest() -> BundleManifest {
        BundleManifest {
            schema_version: "1.0".to_string(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            bundle_type: BundleType::Templates,
            name: "demo".to_string(),
            description: "demo bundle".to_string(),
            version: BundleVersion::parse("1.0.0").unwrap(),
            created_at: "2026-07-26T00:00:00Z".to_string(),
            author: Author {
                name: "a".to_string(),
                email: "a@example.com".to_string(),
                url: None,
                key_id: None,
            },
            content: vec![sample_item("t1", "templates/hello.json")],
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

    #[test]
    fn bundle_id_rejects_uppercase() {
        assert!(BundleId::new("Demo-Bundle").is_err());
    }

    #[test]
    fn valid_manifest_passes() {
        validate_manifest(&sample_manifest()).unwrap();
    }

    #[test]
    fn duplicate_content_id_rejected() {
        let mut m = sample_manifest();
        m.content.push(sample_item("t1", "templates/other.json"));
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn duplicate_content_path_rejected() {
        let mut m = sample_manifest();
        m.content.push(sample_item("t2", "templates/hello.json"));
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn incremental_without_base_version_rejected() {
        let mut m = sample_manifest();
        m.is_incremental = true;
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn incremental_equal_base_version_rejected() {
        let mut m = sample_manifest();
        m.is_incremental = true;
        m.base_version = Some("1.0.0".to_string());
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn non_incremental_with_base_version_rejected() {
        let mut m = sample_manifest();
        m.base_version = Some("0.9.0".to_string());
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn compliance_unknown_content_id_rejected() {
        let mut m = sample_manifest();
        let mut owasp = BTreeMap::new();
        owasp.insert("llm01".to_string(), vec!["nonexistent".to_string()]);
        m.compliance = Some(Compliance {
            owasp_llm_top10: owasp,
            iso_iec_42001: BTreeMap::new(),
        });
        assert!(validate_manifest(&m).is_err());
    }

    #[test]
    fn delta_manifest_all_operations_preserves_order() {
        let delta = DeltaManifest {
            from_version: BundleVersion::parse("1.0.0").unwrap(),
            to_version: BundleVersion::parse("1.1.0").unwrap(),
            add: vec![AddOperation {
                path: ArtifactPath::new("c.txt").unwrap(),
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
            delete: vec![],
            patch: vec![],
            dependencies: DeltaDependencies {
                required: vec!["1.0.0".to_string()],
            },
            rollback: RollbackDescriptor::default(),
        };
        let ops = delta.all_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].path().as_str(), "c.txt");
        assert_eq!(ops[1].path().as_str(), "b.txt");
    }
}
