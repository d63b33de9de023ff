//! Narrow error enum for this crate, converting into [`bundle_core::BundleError`]
//! at the public boundary.

use bundle_core::BundleError;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("backup failed: {0}")]
    Backup(String),

    #[error("conflict check failed: {0}")]
    Conflict(String),

    #[error("installation failed: {0}")]
    Installation(String),

    #[error("rollback failed: {0}")]
    Rollback(String),

    #[error("import cancelled")]
    Cancelled,
}

impl From<ImportError> for BundleError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Validation(msg) => BundleError::validation(msg),
            ImportError::Extraction(msg) => BundleError::archive(msg),
            ImportError::Backup(msg) => BundleError::backup(msg),
            ImportError::Conflict(msg) => BundleError::conflict(msg),
            ImportError::Installation(msg) => BundleError::filesystem(msg),
            ImportError::Rollback(msg) => BundleError::rollback(msg),
            ImportError::Cancelled => BundleError::cancelled("import cancelled"),
        }
    }
}

impl From<bundle_core::BundleError> for ImportError {
    fn from(e: bundle_core::BundleError) -> Self {
        ImportError::Validation(e.to_string())
    }
}

impl From<bundle_archive::errors::ArchiveError> for ImportError {
    fn from(e: bundle_archive::errors::ArchiveError) -> Self {
        ImportError::Extraction(e.to_string())
    }
}

impl From<bundle_delta::errors::DeltaError> for ImportError {
    fn from(e: bundle_delta::errors::DeltaError) -> Self {
        ImportError::Backup(e.to_string())
    }
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Installation(e.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
