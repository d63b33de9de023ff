//! CompressionCodec (C4, compression half).
//!
//! Three modes behind one streaming interface, selected by the manifest's
//! declared algorithm name — the sum-type-plus-registry shape Design Note
//! calls for ("model as sum types with one canonical trait... and a
//! registry keyed by the algorithm name"). `Identity` is a pass-through;
//! `Gzip` wraps `flate2`; `Zstd` wraps the `zstd` crate, the same crates
//! `leynos-whitaker`'s manifest already depends on for this purpose.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::errors::{CodecError, CodecResult};

/// Which compression algorithm a manifest declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Identity,
    Gzip,
    Zstd,
}

impl CodecKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    pub fn parse(s: &str) -> CodecResult<Self> {
        match s {
            "identity" => Ok(Self::Identity),
            "gzip" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            other => Err(CodecError::Compression(format!(
                "unsupported compression algorithm: {other}"
            ))),
        }
    }
}

/// One canonical trait for every compression strategy.
pub trait Codec {
    fn compress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()>;
    fn decompress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()>;
}

/// Pass-through codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Codec for Identity {
    fn compress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        std::io::copy(reader, writer)
            .map_err(|e| CodecError::Compression(format!("identity copy: {e}")))?;
        Ok(())
    }

    fn decompress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        self.compress(reader, writer)
    }
}

/// Gzip codec, default compression level.
#[derive(Debug, Clone, Copy)]
pub struct Gzip {
    pub level: flate2::Compression,
}

impl Default for Gzip {
    fn default() -> Self {
        Self {
            level: flate2::Compression::default(),
        }
    }
}

impl Codec for Gzip {
    fn compress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        let mut encoder = flate2::write::GzEncoder::new(writer, self.level);
        std::io::copy(reader, &mut encoder)
            .map_err(|e| CodecError::Compression(format!("gzip compress: {e}")))?;
        encoder
            .finish()
            .map_err(|e| CodecError::Compression(format!("gzip finish: {e}")))?;
        Ok(())
    }

    fn decompress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        let mut decoder = flate2::read::GzDecoder::new(reader);
        std::io::copy(&mut decoder, writer)
            .map_err(|e| CodecError::Compression(format!("gzip decompress: {e}")))?;
        Ok(())
    }
}

/// Zstandard codec.
#[derive(Debug, Clone, Copy)]
pub struct Zstd {
    pub level: i32,
}

impl Default for Zstd {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl Codec for Zstd {
    fn compress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        let mut encoder = zstd::stream::Encoder::new(writer, self.level)
            .map_err(|e| CodecError::Compression(format!("zstd encoder init: {e}")))?;
        std::io::copy(reader, &mut encoder)
            .map_err(|e| CodecError::Compression(format!("zstd compress: {e}")))?;
        encoder
            .finish()
            .map_err(|e| CodecError::Compression(format!("zstd finish: {e}")))?;
        Ok(())
    }

    fn decompress(&self, reader: &mut dyn Read, writer: &mut dyn Write) -> CodecResult<()> {
        let mut decoder = zstd::stream::Decoder::new(reader)
            .map_err(|e| CodecError::Compression(format!("zstd decoder init: {e}")))?;
        std::io::copy(&mut decoder, writer)
            .map_err(|e| CodecError::Compression(format!("zstd decompress: {e}")))?;
        Ok(())
    }
}

/// Resolve a [`CodecKind`] to its `Codec` implementation.
pub fn codec_for(kind: CodecKind) -> Box<dyn Codec> {
    match kind {
        CodecKind::Identity => Box::new(Identity),
        CodecKind::Gzip => Box::new(Gzip::default()),
        CodecKind::Zstd => Box::new(Zstd::default()),
    }
}
