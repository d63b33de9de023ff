//! Narrow error enum for this crate, converting into [`bundle_core::BundleError`]
//! at the public boundary — same per-crate-enum pattern as
//! `assay-evidence::mandate::signing::VerifyError`.

use bundle_core::BundleError;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("compression error: {0}")]
    Compression(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("authentication failed: wrong password or corrupted archive")]
    AuthFailed,

    #[error("bad header: {0}")]
    BadHeader(String),

    #[error("weak password: {0}")]
    WeakPassword(String),
}

impl From<CodecError> for BundleError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Compression(msg) => BundleError::compression(msg),
            CodecError::Encryption(msg) => BundleError::encryption(msg),
            CodecError::AuthFailed => BundleError::encryption("auth_failed"),
            CodecError::BadHeader(msg) => BundleError::encryption(format!("bad header: {msg}")),
            CodecError::WeakPassword(msg) => BundleError::validation(format!("weak password: {msg}")),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
