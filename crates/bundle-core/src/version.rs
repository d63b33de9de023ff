//! Version parsing and helpers.
//!
//! Mirrors `signia-core::version`'s strict-parse-with-stable-errors stance,
//! backed by the `semver` crate (the version comparator the rest of the
//! retrieved pack already standardizes on, e.g. `Rul1an-assay`'s workspace)
//! instead of hand-rolled MAJOR.MINOR.PATCH parsing.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BundleError, BundleResult};

/// The manifest schema version. Only `"1.0"` is currently recognized.
pub const SCHEMA_VERSION_1_0: &str = "1.0";

/// A validated semantic version (MAJOR.MINOR.PATCH with optional
/// prerelease tag), as required by `BundleManifest.version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleVersion(semver::Version);

impl BundleVersion {
    pub fn parse(s: &str) -> BundleResult<Self> {
        semver::Version::parse(s)
            .map(BundleVersion)
            .map_err(|e| BundleError::validation(format!("invalid semver {s:?}: {e}")))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// True iff `self` and `other` share the same minor version (used by
    /// the compatibility gate's "direct same-minor or next-minor" rule).
    pub fn same_minor(&self, other: &Self) -> bool {
        self.0.major == other.0.major && self.0.minor == other.0.minor
    }

    /// True iff `other` is exactly one minor version ahead of `self`,
    /// within the same major.
    pub fn is_next_minor(&self, other: &Self) -> bool {
        self.0.major == other.0.major && other.0.minor == self.0.minor + 1
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for BundleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BundleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// Validate a manifest's declared schema version string.
pub fn require_schema_version(actual: &str) -> BundleResult<()> {
    if actual == SCHEMA_VERSION_1_0 {
        Ok(())
    } else {
        Err(BundleError::validation(format!(
            "unsupported schema_version: expected {SCHEMA_VERSION_1_0}, got {actual}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_semver() {
        let v = BundleVersion::parse("1.2.3").unwrap();
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 2);
        assert_eq!(v.patch(), 3);
    }

    #[test]
    fn parses_prerelease() {
        let v = BundleVersion::parse("2.0.0-rc.1").unwrap();
        assert!(v.is_prerelease());
    }

    #[test]
    fn rejects_garbage() {
        assert!(BundleVersion::parse("not-a-version").is_err());
    }

    #[test]
    fn orders_correctly() {
        let a = BundleVersion::parse("1.0.0").unwrap();
        let b = BundleVersion::parse("1.1.0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn same_minor_detection() {
        let a = BundleVersion::parse("1.0.3").unwrap();
        let b = BundleVersion::parse("1.0.9").unwrap();
        assert!(a.same_minor(&b));
    }

    #[test]
    fn next_minor_detection() {
        let a = BundleVersion::parse("1.0.3").unwrap();
        let b = BundleVersion::parse("1.1.0").unwrap();
        assert!(a.is_next_minor(&b));
    }

    #[test]
    fn schema_version_gate() {
        require_schema_version("1.0").unwrap();
        assert!(require_schema_version("2.0").is_err());
    }
}
