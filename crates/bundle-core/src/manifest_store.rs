//! ManifestStore (C6): parse, seal, verify, and write `BundleManifest`s.
//!
//! Sealing order is contractual (spec §4.6): content items and their
//! per-file checksums are populated first, then `checksums.manifest` is
//! computed, then the manifest is canonically encoded with `signature=""`
//! and signed, then written with the signature set. Verification reverses
//! these steps. This mirrors `signia-core::model::validate::schema_v1_basic`'s
//! "validation is a function over data" shape, extended here with the
//! filesystem walk that `model.rs` intentionally leaves out.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ed25519_dalek::{SigningKey, VerifyingKey};

use crate::errors::{BundleError, BundleResult};
use crate::hash::{self, Sha256Hex};
use crate::model::{BundleManifest, ContentItem, FileHashEntry};
use crate::sign::{self, VerifyStatus};

/// Parse a manifest from its canonical JSON bytes.
pub fn parse_manifest(bytes: &[u8]) -> BundleResult<BundleManifest> {
    let manifest: BundleManifest = serde_json::from_slice(bytes)
        .map_err(|e| BundleError::validation(format!("failed to parse manifest: {e}")))?;
    crate::version::require_schema_version(&manifest.schema_version)?;
    crate::model::validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Serialize a manifest to canonical JSON bytes, ready to write to
/// `manifest.json`.
pub fn write_manifest(manifest: &BundleManifest) -> BundleResult<Vec<u8>> {
    crate::canonical::to_canonical_bytes(manifest)
}

/// Compute the manifest's self-hash: canonical hash of the manifest with
/// `signature` and `checksums.manifest` cleared.
pub fn compute_manifest_self_hash(manifest: &BundleManifest) -> BundleResult<String> {
    let mut stripped = manifest.clone();
    stripped.signature = String::new();
    stripped.checksums.manifest = String::new();
    hash::hash_canonical(&stripped)
}

/// Hash every `ContentItem`'s file under `root`, returning `path -> digest`.
/// This is the per-file pass spec §5 allows to run in parallel; ordering of
/// the resulting map (a `BTreeMap`, sorted by path) is the observable
/// contract, not the order in which files were hashed.
pub fn compute_content_checksums(
    root: &Path,
    content: &[ContentItem],
) -> BundleResult<BTreeMap<String, String>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let pairs: BundleResult<Vec<(String, String)>> = content
            .par_iter()
            .map(|item| hash_one_content_item(root, item))
            .collect();
        Ok(pairs?.into_iter().collect())
    }
    #[cfg(not(feature = "parallel"))]
    {
        content
            .iter()
            .map(|item| hash_one_content_item(root, item))
            .collect()
    }
}

fn hash_one_content_item(root: &Path, item: &ContentItem) -> BundleResult<(String, String)> {
    let resolved = item.path.resolve_within(root)?;
    let file = File::open(&resolved)
        .map_err(|e| BundleError::filesystem(format!("opening {resolved:?}: {e}")))?;
    let digest = hash::hash_reader(BufReader::new(file))?;
    Ok((item.path.as_str().to_string(), digest))
}

/// Seal a manifest: populate `checksums.content` from the files under
/// `root`, compute `checksums.manifest`, then sign. Returns the sealed
/// manifest; the caller is responsible for writing it to disk.
pub fn seal_manifest(
    mut manifest: BundleManifest,
    root: &Path,
    key: Option<&SigningKey>,
) -> BundleResult<BundleManifest> {
    manifest.checksums.content = compute_content_checksums(root, &manifest.content)?;
    manifest.checksums.manifest = compute_manifest_self_hash(&manifest)?;
    manifest.signature = sign::sign_manifest(&manifest, key)?;
    Ok(manifest)
}

/// Invariant 1: every entry in `checksums.content` exists on disk and
/// matches; every non-manifest, non-signature file under `root` has a
/// corresponding entry.
pub fn verify_content_checksums(manifest: &BundleManifest, root: &Path) -> BundleResult<()> {
    for item in &manifest.content {
        let resolved = item.path.resolve_within(root)?;
        let file = File::open(&resolved)
            .map_err(|e| BundleError::filesystem(format!("opening {resolved:?}: {e}")))?;
        let digest = hash::hash_reader(BufReader::new(file))?;
        if digest != item.checksum.as_str() {
            return Err(BundleError::checksum(format!(
                "content checksum mismatch for {}",
                item.path
            )));
        }
        match manifest.checksums.content.get(item.path.as_str()) {
            Some(recorded) if recorded == &digest => {}
            Some(_) => {
                return Err(BundleError::checksum(format!(
                    "checksums.content entry for {} does not match recomputed hash",
                    item.path
                )))
            }
            None => {
                return Err(BundleError::checksum(format!(
                    "missing checksums.content entry for {}",
                    item.path
                )))
            }
        }
    }
    Ok(())
}

/// Verify the manifest's own self-hash and its inline or envelope
/// signature.
pub fn verify_manifest_integrity(
    manifest: &BundleManifest,
    public_key: &VerifyingKey,
) -> BundleResult<VerifyStatus> {
    let recomputed = compute_manifest_self_hash(manifest)?;
    if recomputed != manifest.checksums.manifest {
        return Err(BundleError::checksum(
            "checksums.manifest does not match recomputed self-hash",
        ));
    }
    sign::verify_manifest(manifest, public_key)
}

/// Build the sorted file-hash manifest used as the offline signature
/// envelope's `content_hash` input (spec §4.3): walk the bundle tree in
/// depth-first order, skipping `signatures/bundle.sig` itself, hash every
/// regular file, sort by path, then canonically hash the sorted list.
pub fn build_file_hash_manifest(root: &Path) -> BundleResult<(Vec<FileHashEntry>, String)> {
    let signature_file = root.join("signatures").join("bundle.sig");
    let mut entries = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| BundleError::filesystem(format!("walking {root:?}: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path() == signature_file {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| BundleError::filesystem(format!("computing relative path: {e}")))?;
        let slash_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let metadata = entry
            .metadata()
            .map_err(|e| BundleError::filesystem(format!("stat {relative:?}: {e}")))?;
        let file = File::open(entry.path())
            .map_err(|e| BundleError::filesystem(format!("opening {relative:?}: {e}")))?;
        let digest = hash::hash_reader(BufReader::new(file))?;
        entries.push(FileHashEntry {
            path: slash_path,
            hash: digest,
            size: metadata.len(),
            mode: file_mode(&metadata),
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    let content_hash = hash::hash_canonical(&entries)?;
    Ok((entries, content_hash))
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode()
}

#[cfg(not(unix))]
fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}

/// Validate a raw digest string is well-formed before storing it.
pub fn validate_digest(raw: &str) -> BundleResult<Sha256Hex> {
    Sha256Hex::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::path::ArtifactPath;
    use crate::version::BundleVersion;
    use std::collections::BTreeMap as Map;
    use std::io::Write;
    use tempfile::tempdir;

    fn sample_manifest(content: Vec<ContentItem>) -> BundleManifest {
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

    #[test]
    fn seal_then_verify_round_trip() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        let file_path = dir.path().join("templates/hello.json");
        let mut f = File::create(&file_path).unwrap();
        f.write_all(b"{\"id\":\"t1\"}").unwrap();
        drop(f);

        let digest = {
            let f = File::open(&file_path).unwrap();
            hash::hash_reader(BufReader::new(f)).unwrap()
        };
        let item = ContentItem {
            path: ArtifactPath::new("templates/hello.json").unwrap(),
            kind: ContentType::Template,
            id: "t1".to_string(),
            version: Some("1.0.0".to_string()),
            description: None,
            checksum: Sha256Hex::new(digest).unwrap(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            metadata: Map::new(),
        };
        let manifest = sample_manifest(vec![item]);
        let (public, private) = sign::generate_keypair();
        let sealed = seal_manifest(manifest, dir.path(), Some(&private)).unwrap();

        verify_content_checksums(&sealed, dir.path()).unwrap();
        assert_eq!(
            verify_manifest_integrity(&sealed, &public).unwrap(),
            VerifyStatus::Valid
        );
    }

    #[test]
    fn tampered_file_fails_checksum_verification() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("templates")).unwrap();
        let file_path = dir.path().join("templates/hello.json");
        std::fs::write(&file_path, b"{\"id\":\"t1\"}").unwrap();

        let digest = {
            let f = File::open(&file_path).unwrap();
            hash::hash_reader(BufReader::new(f)).unwrap()
        };
        let item = ContentItem {
            path: ArtifactPath::new("templates/hello.json").unwrap(),
            kind: ContentType::Template,
            id: "t1".to_string(),
            version: Some("1.0.0".to_string()),
            description: None,
            checksum: Sha256Hex::new(digest).unwrap(),
            bundle_id: BundleId::new("demo-bundle").unwrap(),
            metadata: Map::new(),
        };
        let manifest = sample_manifest(vec![item]);
        let (_public, private) = sign::generate_keypair();
        let sealed = seal_manifest(manifest, dir.path(), Some(&private)).unwrap();

        std::fs::write(&file_path, b"tampered").unwrap();
        assert!(verify_content_checksums(&sealed, dir.path()).is_err());
    }

    #[test]
    fn build_file_hash_manifest_sorts_by_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"2").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"1").unwrap();
        let (entries, content_hash) = build_file_hash_manifest(dir.path()).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec!["a.txt".to_string(), "b.txt".to_string()]);
        assert!(content_hash.starts_with("sha256:"));
    }

    #[test]
    fn parse_manifest_rejects_unsupported_schema_version() {
        let manifest = sample_manifest(vec![]);
        let mut value = serde_json::to_value(&manifest).unwrap();
        value["schema_version"] = serde_json::json!("9.9");
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(parse_manifest(&bytes).is_err());
    }
}
