//! Bundle-relative path newtype and path-safety checks.
//!
//! Spec §3 invariant 6: "Paths are normalized; a path escaping the bundle
//! root is a fatal load error." This module is the single place that
//! decision is made, shared by `ManifestStore` validation (this crate) and
//! `bundle-archive`'s extraction safety check, following the newtype-with
//! -validation style of `leynos-whitaker::installer::artefact`'s `GitSha`
//! / `Sha256Digest` / `TargetTriple`.

use std::fmt;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::errors::{BundleError, BundleResult};

/// A validated, forward-slash, bundle-relative path.
///
/// Guarantees on construction:
/// - non-empty
/// - uses `/` as the only separator, regardless of host platform
/// - contains no `..` component
/// - does not start with `/` (no absolute root)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactPath(String);

impl ArtifactPath {
    pub fn new(raw: impl Into<String>) -> BundleResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(BundleError::validation("artifact path must not be empty"));
        }
        if raw.starts_with('/') {
            return Err(BundleError::validation(format!(
                "artifact path must be relative, got {raw:?}"
            )));
        }
        if raw.contains('\\') {
            return Err(BundleError::validation(format!(
                "artifact path must use '/' separators, got {raw:?}"
            )));
        }
        for segment in raw.split('/') {
            if segment.is_empty() {
                return Err(BundleError::validation(format!(
                    "artifact path has an empty segment: {raw:?}"
                )));
            }
            if segment == ".." {
                return Err(BundleError::validation(format!(
                    "artifact path escapes the bundle root: {raw:?}"
                )));
            }
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join this path onto a root directory, guaranteeing the result stays
    /// within `root` even after `..`-free normalization (defense in depth
    /// against symlink tricks encountered during extraction).
    pub fn resolve_within(&self, root: &Path) -> BundleResult<PathBuf> {
        let joined = root.join(&self.0);
        let normalized = normalize_lexically(&joined);
        let root_normalized = normalize_lexically(root);
        if !normalized.starts_with(&root_normalized) {
            return Err(BundleError::archive(format!(
                "path {:?} escapes root {:?}",
                self.0, root
            )));
        }
        Ok(joined)
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lexical (no filesystem access) path normalization via `path-clean`:
/// collapses `.` and resolves `..` against the components already
/// accumulated. Does not touch the filesystem, so it cannot be fooled by a
/// symlink swapped in between the check and the write — callers that need
/// that guarantee must also refuse `..` up front, which
/// [`ArtifactPath::new`] already does.
fn normalize_lexically(path: &Path) -> PathBuf {
    path.to_path_buf().clean()
}
