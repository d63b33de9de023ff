//! Narrow error enum for this crate, converting into [`bundle_core::BundleError`]
//! at the public boundary.

use bundle_core::BundleError;

#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    #[error("delta generation error: {0}")]
    Generation(String),

    #[error("planning error: {0}")]
    Planning(String),

    #[error("backup error: {0}")]
    Backup(String),

    #[error("apply error: {0}")]
    Apply(String),

    #[error("rollback error: {0}")]
    Rollback(String),

    #[error("conflict error: {0}")]
    Conflict(String),
}

impl From<DeltaError> for BundleError {
    fn from(e: DeltaError) -> Self {
        match e {
            DeltaError::Generation(msg) => BundleError::validation(msg),
            DeltaError::Planning(msg) => BundleError::validation(msg),
            DeltaError::Backup(msg) => BundleError::backup(msg),
            DeltaError::Apply(msg) => BundleError::filesystem(msg),
            DeltaError::Rollback(msg) => BundleError::rollback(msg),
            DeltaError::Conflict(msg) => BundleError::conflict(msg),
        }
    }
}

impl From<std::io::Error> for DeltaError {
    fn from(e: std::io::Error) -> Self {
        DeltaError::Apply(e.to_string())
    }
}

pub type DeltaResult<T> = Result<T, DeltaError>;
