//! Narrow error enum for this crate, converting into [`bundle_core::BundleError`]
//! at the public boundary.

use bundle_core::BundleError;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive io error: {0}")]
    Io(String),

    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("unsafe entry rejected: {0}")]
    UnsafeEntry(String),

    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),
}

impl From<ArchiveError> for BundleError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Io(msg) => BundleError::archive(msg),
            ArchiveError::PathTraversal(msg) => BundleError::archive(format!("path traversal: {msg}")),
            ArchiveError::UnsafeEntry(msg) => BundleError::archive(format!("unsafe entry: {msg}")),
            ArchiveError::UnsupportedFormat(msg) => BundleError::archive(format!("unsupported format: {msg}")),
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(e: std::io::Error) -> Self {
        ArchiveError::Io(e.to_string())
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
