//! The 256-byte encrypted-archive header (spec §4.4/§6).
//!
//! Layout: 8-byte ASCII magic `"LLMR-ENC"`, followed by a canonical JSON
//! body `{algorithm, version, header_size}`, zero-padded to exactly 256
//! bytes total. The decryptor refuses to proceed if the magic is missing.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::errors::{CodecError, CodecResult};

pub const MAGIC: &[u8; 8] = b"LLMR-ENC";
pub const HEADER_SIZE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedHeader {
    pub algorithm: String,
    pub version: u32,
    pub header_size: u32,
}

impl EncryptedHeader {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            version: 1,
            header_size: HEADER_SIZE as u32,
        }
    }

    pub fn write_to(&self, writer: &mut dyn Write) -> CodecResult<()> {
        let body = bundle_core::canonical::to_canonical_bytes(self)
            .map_err(|e| CodecError::BadHeader(format!("encoding header: {e}")))?;
        if MAGIC.len() + body.len() > HEADER_SIZE {
            return Err(CodecError::BadHeader(
                "header body does not fit in 256 bytes".to_string(),
            ));
        }
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[..MAGIC.len()].copy_from_slice(MAGIC);
        buf[MAGIC.len()..MAGIC.len() + body.len()].copy_from_slice(&body);
        writer
            .write_all(&buf)
            .map_err(|e| CodecError::BadHeader(format!("writing header: {e}")))?;
        Ok(())
    }

    pub fn read_from(reader: &mut dyn Read) -> CodecResult<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut buf)
            .map_err(|e| CodecError::BadHeader(format!("reading header: {e}")))?;
        if &buf[..MAGIC.len()] != MAGIC {
            return Err(CodecError::BadHeader(
                "missing LLMR-ENC magic".to_string(),
            ));
        }
        let body = &buf[MAGIC.len()..];
        let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        let header: EncryptedHeader = serde_json::from_slice(&body[..end])
            .map_err(|e| CodecError::BadHeader(format!("parsing header body: {e}")))?;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips() {
        let header = EncryptedHeader::new("chacha20poly1305");
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..8], MAGIC);
        let parsed = EncryptedHeader::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_missing_magic() {
        let buf = vec![0u8; HEADER_SIZE];
        assert!(EncryptedHeader::read_from(&mut Cursor::new(buf)).is_err());
    }
}
