//! Shared path-safety and permission-sanitization logic for extraction.
//!
//! Spec §4.5: every entry path must be relative, free of `..` components,
//! and resolve inside the extraction root; setuid/setgid/sticky bits are
//! stripped from preserved file modes. Built on
//! [`bundle_core::ArtifactPath::resolve_within`], the same guard
//! `ManifestStore` uses for its own root-escape check (spec §3 invariant 6).

use std::path::{Path, PathBuf};

use bundle_core::ArtifactPath;

use crate::errors::{ArchiveError, ArchiveResult};

/// Permission bits to keep: owner/group/other read-write-execute only.
const MODE_MASK: u32 = 0o777;

/// Validate an archive entry's declared path and resolve it to a concrete
/// extraction target within `dest`.
pub fn resolve_entry_path(raw_name: &str, dest: &Path) -> ArchiveResult<PathBuf> {
    let artifact_path = ArtifactPath::new(raw_name)
        .map_err(|e| ArchiveError::PathTraversal(format!("{raw_name:?}: {e}")))?;
    artifact_path
        .resolve_within(dest)
        .map_err(|e| ArchiveError::PathTraversal(format!("{raw_name:?}: {e}")))
}

/// Strip setuid/setgid/sticky bits, keeping only rwx permission bits.
pub fn sanitize_mode(mode: u32) -> u32 {
    mode & MODE_MASK
}

#[cfg(unix)]
pub fn apply_mode(path: &Path, mode: u32) -> ArchiveResult<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, Permissions::from_mode(sanitize_mode(mode)))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn apply_mode(_path: &Path, _mode: u32) -> ArchiveResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn resolve_entry_path_accepts_relative_entry() {
        let dest = tempdir().unwrap();
        let resolved = resolve_entry_path("templates/foo.json", dest.path()).unwrap();
        assert_eq!(resolved, dest.path().join("templates/foo.json"));
    }

    #[test]
    fn resolve_entry_path_rejects_dotdot() {
        let dest = tempdir().unwrap();
        assert!(resolve_entry_path("../../etc/passwd", dest.path()).is_err());
    }

    #[test]
    fn resolve_entry_path_rejects_absolute() {
        let dest = tempdir().unwrap();
        assert!(resolve_entry_path("/etc/passwd", dest.path()).is_err());
    }

    #[test]
    fn sanitize_mode_strips_setuid() {
        assert_eq!(sanitize_mode(0o4755), 0o755);
        assert_eq!(sanitize_mode(0o2755), 0o755);
        assert_eq!(sanitize_mode(0o1755), 0o755);
    }
}
