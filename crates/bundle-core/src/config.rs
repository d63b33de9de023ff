//! Configuration structures for bundle-core.
//!
//! Defines explicit, serializable configuration objects used by higher-level
//! components (CLI, import engine) to control limits and defaults. The core
//! crate itself does not read environment variables or files directly —
//! config always arrives as an explicit value, same stance as
//! `signia-core::config`, so behavior stays reproducible across runs.

use serde::{Deserialize, Serialize};

use crate::errors::{BundleError, BundleResult};

/// Global configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub hashing: HashingConfig,
    pub limits: LimitsConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            hashing: HashingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Hashing-related configuration. Only SHA-256 is currently supported, but
/// the field is kept explicit (no implicit default baked into call sites)
/// in case a future schema version widens it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    pub algorithm: HashAlgorithm,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
        }
    }
}

/// Resource and complexity limits enforced while loading or importing a
/// bundle, so a hostile or corrupt bundle cannot exhaust memory or disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_total_bytes: u64,
    pub max_file_bytes: u64,
    pub max_files: usize,
    pub max_path_depth: usize,
    pub max_manifest_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_total_bytes: 4 * 1024 * 1024 * 1024,
            max_file_bytes: 512 * 1024 * 1024,
            max_files: 200_000,
            max_path_depth: 64,
            max_manifest_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &CoreConfig) -> BundleResult<()> {
    if cfg.limits.max_file_bytes > cfg.limits.max_total_bytes {
        return Err(BundleError::config(
            "max_file_bytes must not exceed max_total_bytes",
        ));
    }
    if cfg.limits.max_files == 0 {
        return Err(BundleError::config("max_files must be greater than zero"));
    }
    if cfg.limits.max_path_depth == 0 {
        return Err(BundleError::config(
            "max_path_depth must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CoreConfig::default();
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn invalid_limits_detected() {
        let mut cfg = CoreConfig::default();
        cfg.limits.max_file_bytes = cfg.limits.max_total_bytes + 1;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn zero_max_files_detected() {
        let mut cfg = CoreConfig::default();
        cfg.limits.max_files = 0;
        assert!(validate_config(&cfg).is_err());
    }
}
