//! Narrow error enum for this crate, converting into [`bundle_core::BundleError`]
//! at the public boundary.

use bundle_core::BundleError;

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("structure validation error: {0}")]
    Structure(String),

    #[error("compatibility config error: {0}")]
    Config(String),
}

impl From<PolicyError> for BundleError {
    fn from(e: PolicyError) -> Self {
        match e {
            PolicyError::Structure(msg) => BundleError::validation(msg),
            PolicyError::Config(msg) => BundleError::config(msg),
        }
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;
