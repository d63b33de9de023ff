//! Streaming compression and password-based AEAD encryption for offline
//! distribution bundles (C4).
//!
//! Compression and encryption are two orthogonal layers, applied in that
//! order when both are requested (spec §4.4): `compression::codec_for`
//! picks the algorithm named by the manifest, then `aead::aead_for` wraps
//! the compressed bytes behind the 256-byte [`header::EncryptedHeader`].

pub mod aead;
pub mod compression;
pub mod errors;
pub mod header;
pub mod password;

pub mod prelude {
    pub use crate::aead::{aead_for, Aead, AeadKind, AesGcm256, ChaCha20Poly1305Aead};
    pub use crate::compression::{codec_for, Codec, CodecKind};
    pub use crate::errors::{CodecError, CodecResult};
    pub use crate::header::EncryptedHeader;
    pub use crate::password::PasswordPolicy;
}
