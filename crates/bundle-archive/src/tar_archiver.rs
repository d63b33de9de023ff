//! `TarArchiver` — tar with an optional gzip layer, following
//! `assay-evidence::bundle::writer`'s "manifest first, deterministic tar
//! header" discipline and `Elektrobit-rupdate::core::bundle::Bundle`'s
//! gzip-or-not dispatch on read.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use bundle_core::ArtifactPath;
use tar::EntryType;

use crate::errors::{ArchiveError, ArchiveResult};
use crate::format::ArchiveFormat;
use crate::safety::{apply_mode, resolve_entry_path, sanitize_mode};
use crate::Archiver;

#[derive(Debug, Clone, Copy)]
pub struct TarArchiver {
    pub gzip: bool,
}

enum TarWriter {
    Plain(File),
    Gz(flate2::write::GzEncoder<File>),
}

impl Write for TarWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gz(w) => w.flush(),
        }
    }
}

impl TarWriter {
    fn finish(self) -> ArchiveResult<()> {
        if let Self::Gz(encoder) = self {
            encoder.finish()?;
        }
        Ok(())
    }
}

impl TarArchiver {
    pub fn new(gzip: bool) -> Self {
        Self { gzip }
    }

    fn open_writer(&self, dest: &Path) -> ArchiveResult<TarWriter> {
        let file = File::create(dest)?;
        if self.gzip {
            let encoder = flate2::GzBuilder::new()
                .mtime(0)
                .write(file, flate2::Compression::default());
            Ok(TarWriter::Gz(encoder))
        } else {
            Ok(TarWriter::Plain(file))
        }
    }

    fn open_reader(&self, archive: &Path) -> ArchiveResult<Box<dyn Read>> {
        let file = File::open(archive)?;
        if self.gzip {
            Ok(Box::new(flate2::read::GzDecoder::new(file)))
        } else {
            Ok(Box::new(file))
        }
    }
}

impl Archiver for TarArchiver {
    fn format(&self) -> ArchiveFormat {
        if self.gzip {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::Tar
        }
    }

    fn write_archive(&self, root: &Path, entries: &[ArtifactPath], dest: &Path) -> ArchiveResult<()> {
        let mut sorted: Vec<&ArtifactPath> = entries.iter().collect();
        sorted.sort();

        let writer = self.open_writer(dest)?;
        let mut builder = tar::Builder::new(writer);
        builder.mode(tar::HeaderMode::Deterministic);

        for entry in sorted {
            let source = root.join(entry.as_str());
            let metadata = fs::metadata(&source)?;
            let mut header = tar::Header::new_gnu();
            header.set_size(metadata.len());
            header.set_mtime(0);
            header.set_mode(sanitize_mode(unix_mode(&metadata)));
            header.set_path(entry.as_str())?;
            header.set_entry_type(EntryType::Regular);
            header.set_cksum();
            let mut file = File::open(&source)?;
            builder.append(&header, &mut file)?;
        }
        let writer = builder.into_inner()?;
        writer.finish()?;
        Ok(())
    }

    fn extract_archive(&self, archive: &Path, dest: &Path) -> ArchiveResult<()> {
        let reader = self.open_reader(archive)?;
        let mut tar_archive = tar::Archive::new(reader);
        for entry in tar_archive.entries()? {
            let mut entry = entry?;
            let entry_type = entry.header().entry_type();
            if !matches!(entry_type, EntryType::Regular | EntryType::Directory) {
                return Err(ArchiveError::UnsafeEntry(format!(
                    "unsupported tar entry type {entry_type:?}"
                )));
            }
            let raw_name = entry.path()?.to_string_lossy().into_owned();
            let name = raw_name.trim_end_matches('/');
            if entry_type == EntryType::Directory {
                let dir = resolve_entry_path(name, dest)?;
                fs::create_dir_all(dir)?;
                continue;
            }
            let target = resolve_entry_path(name, dest)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            std::io::copy(&mut entry, &mut out)?;
            let mode = entry.header().mode().unwrap_or(0o644);
            apply_mode(&target, mode)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_sample(root: &Path) -> Vec<ArtifactPath> {
        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("templates/a.json"), b"{\"a\":1}").unwrap();
        fs::write(root.join("manifest.json"), b"{}").unwrap();
        vec![
            ArtifactPath::new("manifest.json").unwrap(),
            ArtifactPath::new("templates/a.json").unwrap(),
        ]
    }

    #[test]
    fn tar_gz_round_trips() {
        let src = tempdir().unwrap();
        let entries = write_sample(src.path());
        let archive_path = src.path().join("out.tar.gz");
        let archiver = TarArchiver::new(true);
        archiver
            .write_archive(src.path(), &entries, &archive_path)
            .unwrap();

        let dest = tempdir().unwrap();
        archiver.extract_archive(&archive_path, dest.path()).unwrap();
        assert_eq!(
            fs::read(dest.path().join("templates/a.json")).unwrap(),
            b"{\"a\":1}"
        );
    }

    #[test]
    fn plain_tar_round_trips() {
        let src = tempdir().unwrap();
        let entries = write_sample(src.path());
        let archive_path = src.path().join("out.tar");
        let archiver = TarArchiver::new(false);
        archiver
            .write_archive(src.path(), &entries, &archive_path)
            .unwrap();

        let dest = tempdir().unwrap();
        archiver.extract_archive(&archive_path, dest.path()).unwrap();
        assert_eq!(fs::read(dest.path().join("manifest.json")).unwrap(), b"{}");
    }

    #[test]
    fn extract_rejects_traversal_entry() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("evil.txt"), b"pwned").unwrap();
        let archive_path = src.path().join("evil.tar");
        let file = File::create(&archive_path).unwrap();
        let mut builder = tar::Builder::new(file);
        let mut header = tar::Header::new_gnu();
        header.set_size(5);
        header.set_mode(0o644);
        header.set_path("../escaped.txt").unwrap();
        header.set_cksum();
        builder.append(&header, &b"pwned"[..]).unwrap();
        builder.finish().unwrap();

        let dest = tempdir().unwrap();
        let archiver = TarArchiver::new(false);
        assert!(archiver.extract_archive(&archive_path, dest.path()).is_err());
    }
}
