//! tar/zip archiving for offline distribution bundles, with
//! path-traversal-safe extraction (C5).
//!
//! Writing is deterministic: entries are sorted by path, mtimes are
//! zeroed, and setuid/setgid/sticky bits never survive a round trip.
//! Extraction refuses any entry that would land outside the destination
//! directory or whose entry type isn't a plain file or directory.

use std::path::Path;

use bundle_core::ArtifactPath;

use crate::errors::ArchiveResult;
use crate::format::ArchiveFormat;

pub mod errors;
pub mod format;
pub mod safety;
pub mod tar_archiver;
pub mod zip_archiver;

/// One canonical trait for every archive strategy, selected by
/// [`ArchiveFormat`].
pub trait Archiver {
    fn format(&self) -> ArchiveFormat;

    /// Write `entries` (each resolved against `root`) into `dest` as an
    /// archive, in deterministic sorted-path order.
    fn write_archive(&self, root: &Path, entries: &[ArtifactPath], dest: &Path) -> ArchiveResult<()>;

    /// Extract `archive` into `dest`, rejecting any entry that would
    /// escape it.
    fn extract_archive(&self, archive: &Path, dest: &Path) -> ArchiveResult<()>;
}

/// Resolve an [`ArchiveFormat`] to its `Archiver` implementation.
pub fn archiver_for(format: ArchiveFormat) -> Box<dyn Archiver> {
    match format {
        ArchiveFormat::Tar => Box::new(tar_archiver::TarArchiver::new(false)),
        ArchiveFormat::TarGz => Box::new(tar_archiver::TarArchiver::new(true)),
        ArchiveFormat::Zip => Box::new(zip_archiver::ZipArchiver),
    }
}

pub mod prelude {
    pub use crate::errors::{ArchiveError, ArchiveResult};
    pub use crate::format::ArchiveFormat;
    pub use crate::tar_archiver::TarArchiver;
    pub use crate::zip_archiver::ZipArchiver;
    pub use crate::{archiver_for, Archiver};
}
