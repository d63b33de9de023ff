//! The closed error taxonomy shared by every bundle-engine crate.
//!
//! Each crate further up the stack (`bundle-codec`, `bundle-archive`,
//! `bundle-policy`, `bundle-delta`, `bundle-import`) defines its own narrow
//! `thiserror` enum and converts into [`BundleError`] at its public boundary,
//! the way `assay-evidence::mandate::signing::VerifyError` stays local to its
//! crate while `signia-core` keeps one shared `SigniaError` for the crate it
//! lives in. Never use a package-global logger or `panic!` to report these;
//! always return a `BundleResult`.

use std::fmt;

/// Severity attached to every [`BundleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// The closed set of error kinds from the specification's error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("signature error: {0}")]
    Signature(String),

    #[error("checksum error: {0}")]
    Checksum(String),

    #[error("compatibility error: {0}")]
    Compatibility(String),

    #[error("filesystem error: {0}")]
    FileSystem(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("conflict error: {0}")]
    Conflict(String),

    #[error("backup error: {0}")]
    Backup(String),

    #[error("rollback error: {0}")]
    Rollback(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl BundleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    pub fn checksum(msg: impl Into<String>) -> Self {
        Self::Checksum(msg.into())
    }

    pub fn compatibility(msg: impl Into<String>) -> Self {
        Self::Compatibility(msg.into())
    }

    pub fn filesystem(msg: impl Into<String>) -> Self {
        Self::FileSystem(msg.into())
    }

    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    pub fn compression(msg: impl Into<String>) -> Self {
        Self::Compression(msg.into())
    }

    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backup(msg: impl Into<String>) -> Self {
        Self::Backup(msg.into())
    }

    pub fn rollback(msg: impl Into<String>) -> Self {
        Self::Rollback(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Severity per the specification's closed taxonomy.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Rollback(_) => Severity::Critical,
            Self::Signature(_) | Self::Checksum(_) | Self::Archive(_) | Self::Backup(_) => {
                Severity::High
            }
            Self::Validation(_)
            | Self::Compatibility(_)
            | Self::Conflict(_)
            | Self::Encryption(_)
            | Self::Compression(_) => Severity::Medium,
            Self::FileSystem(_) | Self::Config(_) | Self::Cancelled(_) | Self::Unknown(_) => {
                Severity::Low
            }
        }
    }

    /// Whether a caller may retry this error (bounded attempts, default 3).
    pub fn recoverable(&self) -> bool {
        matches!(self, Self::FileSystem(_) | Self::Cancelled(_))
    }
}

impl From<std::io::Error> for BundleError {
    fn from(e: std::io::Error) -> Self {
        BundleError::FileSystem(e.to_string())
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(e: serde_json::Error) -> Self {
        BundleError::Validation(format!("json: {e}"))
    }
}

pub type BundleResult<T> = Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_is_critical() {
        assert_eq!(BundleError::rollback("x").severity(), Severity::Critical);
    }

    #[test]
    fn filesystem_is_recoverable() {
        assert!(BundleError::filesystem("x").recoverable());
    }

    #[test]
    fn conflict_is_not_recoverable_by_default() {
        assert!(!BundleError::conflict("x").recoverable());
    }
}
