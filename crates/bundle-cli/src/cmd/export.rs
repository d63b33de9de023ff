use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context as _;
use bundle_archive::archiver_for;
use bundle_archive::format::ArchiveFormat;
use bundle_codec::aead::{aead_for, AeadKind};
use bundle_codec::compression::{codec_for, CodecKind};
use bundle_codec::header::EncryptedHeader;
use bundle_codec::password::PasswordPolicy;
use serde::Serialize;

use crate::errors::CliError;
use crate::io::tree::collect_artifact_paths;
use crate::output;

#[derive(Debug, Serialize)]
struct ExportOut {
    out: String,
    compression: String,
    encryption: Option<String>,
}

/// Archive a bundle directory, then layer compression and (optionally)
/// password-based AEAD encryption on top, each an independent wrapper
/// around the raw tar bytes rather than a property of the archive format
/// itself.
pub async fn run(bundle: &PathBuf, out: &PathBuf, compression: Option<&str>, encrypt: Option<&str>) -> anyhow::Result<()> {
    let entries = collect_artifact_paths(bundle)?;

    let scratch_tar = out.with_extension("tar.tmp");
    archiver_for(ArchiveFormat::Tar).write_archive(bundle, &entries, &scratch_tar)?;
    let tar_bytes = fs::read(&scratch_tar).with_context(|| format!("reading {scratch_tar:?}"))?;
    let _ = fs::remove_file(&scratch_tar);

    let codec_kind = match compression {
        Some(s) => CodecKind::parse(s).map_err(|e| CliError::InvalidArgs(e.to_string()))?,
        None => CodecKind::Identity,
    };
    let codec = codec_for(codec_kind);
    let mut compressed = Vec::new();
    codec.compress(&mut Cursor::new(tar_bytes), &mut compressed)?;

    let final_bytes = match encrypt {
        Some(alg) => {
            let kind = AeadKind::parse(alg).map_err(|e| CliError::InvalidArgs(e.to_string()))?;
            let password = std::env::var("BUNDLE_PASSWORD").map_err(|_| {
                CliError::InvalidArgs("BUNDLE_PASSWORD must be set to export an encrypted archive".to_string())
            })?;
            PasswordPolicy::standard()
                .check(&password)
                .map_err(|e| CliError::InvalidArgs(e.to_string()))?;
            let aead = aead_for(kind);
            let sealed = aead.seal(&compressed, password.as_bytes())?;
            let header = EncryptedHeader::new(aead.algorithm_name());
            let mut buf = Vec::new();
            header.write_to(&mut buf)?;
            buf.extend_from_slice(&sealed);
            buf
        }
        None => compressed,
    };

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(out, &final_bytes).with_context(|| format!("writing {out:?}"))?;

    output::print(&ExportOut {
        out: out.display().to_string(),
        compression: codec_kind.as_str().to_string(),
        encryption: encrypt.map(|s| s.to_string()),
    })
}
