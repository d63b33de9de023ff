//! `ZipArchiver` — the `zip` crate, the format `leynos-whitaker` packages
//! its installer artefacts with.

use std::fs::{self, File};
use std::path::Path;

use bundle_core::ArtifactPath;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{ArchiveError, ArchiveResult};
use crate::format::ArchiveFormat;
use crate::safety::{resolve_entry_path, sanitize_mode};
use crate::Archiver;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn write_archive(&self, root: &Path, entries: &[ArtifactPath], dest: &Path) -> ArchiveResult<()> {
        let mut sorted: Vec<&ArtifactPath> = entries.iter().collect();
        sorted.sort();

        let file = File::create(dest)?;
        let mut writer = ZipWriter::new(file);
        for entry in sorted {
            let source = root.join(entry.as_str());
            let metadata = fs::metadata(&source)?;
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default())
                .unix_permissions(sanitize_mode(unix_mode(&metadata)));
            writer
                .start_file(entry.as_str(), options)
                .map_err(|e| ArchiveError::Io(format!("zip start_file: {e}")))?;
            let bytes = fs::read(&source)?;
            std::io::Write::write_all(&mut writer, &bytes)?;
        }
        writer
            .finish()
            .map_err(|e| ArchiveError::Io(format!("zip finish: {e}")))?;
        Ok(())
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> ArchiveResult<()> {
        let file = File::open(archive)?;
        let mut zip_archive =
            ZipArchive::new(file).map_err(|e| ArchiveError::Io(format!("zip open: {e}")))?;

        for i in 0..zip_archive.len() {
            let mut zip_file = zip_archive
                .by_index(i)
                .map_err(|e| ArchiveError::Io(format!("zip entry {i}: {e}")))?;
            let name = zip_file.name().to_string();

            if let Some(mode) = zip_file.unix_mode() {
                if mode & S_IFMT == S_IFLNK {
                    return Err(ArchiveError::UnsafeEntry(format!(
                        "symlink entries are rejected: {name}"
                    )));
                }
            }
            if zip_file.is_dir() {
                let dir = resolve_entry_path(name.trim_end_matches('/'), dest)?;
                fs::create_dir_all(dir)?;
                continue;
            }

            let target = resolve_entry_path(&name, dest)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut zip_file, &mut out)?;

            #[cfg(unix)]
            if let Some(mode) = zip_file.unix_mode() {
                crate::safety::apply_mode(&target, mode)?;
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}
