//! Archive format selection and gzip sniffing.
//!
//! The sniffing approach mirrors `Elektrobit-rupdate::core::bundle::Bundle::is_gzipped`:
//! peek the first two bytes for the gzip magic (`0x1f 0x8b`) without consuming
//! the stream, rather than trusting a file extension.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::errors::{ArchiveError, ArchiveResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }

    pub fn parse(s: &str) -> ArchiveResult<Self> {
        match s {
            "tar" => Ok(Self::Tar),
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            "zip" => Ok(Self::Zip),
            other => Err(ArchiveError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Guess the format of an existing archive file from its magic bytes and
    /// extension, preferring magic bytes where they disambiguate.
    pub fn detect(path: &Path) -> ArchiveResult<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let mut magic = [0u8; 4];
        let n = file.read(&mut magic)?;
        if n >= 2 && magic[..2] == GZIP_MAGIC {
            return Ok(Self::TarGz);
        }
        if n >= 4 && &magic[..4] == b"PK\x03\x04" {
            return Ok(Self::Zip);
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("zip") => Ok(Self::Zip),
            Some("tgz") => Ok(Self::TarGz),
            _ => Ok(Self::Tar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_as_str() {
        for fmt in [ArchiveFormat::Tar, ArchiveFormat::TarGz, ArchiveFormat::Zip] {
            assert_eq!(ArchiveFormat::parse(fmt.as_str()).unwrap(), fmt);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(ArchiveFormat::parse("rar").is_err());
    }
}
