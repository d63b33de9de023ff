//! `CompatibilityGate` (C8): the nine ordered pre-install checks from spec
//! §4.8, each returning an [`Issue`] with a severity and whether a targeted
//! override relaxes it. Version comparisons are `semver`-crate-backed, the
//! crate the whole pack's Rust projects use for this (e.g. `Rul1an-assay`'s
//! workspace).

use std::collections::BTreeMap;

use bundle_core::BundleVersion;
use serde::{Deserialize, Serialize};

/// `{severity, can_override, code, message}` per spec §4.8. `code`
/// identifies which check produced the issue and doubles as the key a
/// targeted [`Overrides`] flag relaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub can_override: bool,
    pub code: String,
    pub message: String,
}

impl Issue {
    fn new(severity: Severity, can_override: bool, code: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            can_override,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// An entry in the configured upgrade-path allowlist. `x` in any version
/// component matches any value. `direct` distinguishes a path that can be
/// applied in one step from one that must stop at `intermediate` first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradePath {
    pub from_pattern: String,
    pub to_pattern: String,
    pub direct: bool,
    pub intermediate: Option<String>,
}

fn pattern_matches(pattern: &str, version: &BundleVersion) -> bool {
    let actual = [version.major(), version.minor(), version.patch()];
    let parts: Vec<&str> = pattern.split('.').collect();
    if parts.len() != 3 {
        return false;
    }
    parts.iter().zip(actual.iter()).all(|(p, v)| *p == "x" || p.parse::<u64>().ok() == Some(*v))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakingChange {
    pub from_major: u64,
    pub to_major: u64,
    pub migration_guide: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityConfig {
    pub strict: bool,
    pub allow_downgrade: bool,
    pub allow_prerelease: bool,
    pub required_components: Vec<String>,
    pub supported_platforms: Vec<(String, String)>,
    pub min_disk_bytes: u64,
    pub min_memory_bytes: u64,
    pub upgrade_paths: Vec<UpgradePath>,
    pub deprecated_features: BTreeMap<String, Vec<String>>,
    pub breaking_changes: Vec<BreakingChange>,
}

impl Default for CompatibilityConfig {
    fn default() -> Self {
        Self {
            strict: false,
            allow_downgrade: false,
            allow_prerelease: false,
            required_components: Vec::new(),
            supported_platforms: Vec::new(),
            min_disk_bytes: 0,
            min_memory_bytes: 0,
            upgrade_paths: Vec::new(),
            deprecated_features: BTreeMap::new(),
            breaking_changes: Vec::new(),
        }
    }
}

/// What the gate observed about the machine it is installing onto.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedEnvironment {
    pub environment: String,
    pub os: String,
    pub arch: String,
    pub available_disk_bytes: u64,
    pub available_memory_bytes: u64,
    pub available_components: Vec<String>,
}

/// Explicit caller overrides; each relaxes a specific check category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Overrides {
    pub force: bool,
    pub skip_version: bool,
    pub skip_components: bool,
    pub skip_environment: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub compatible: bool,
    pub issues: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub metadata: BTreeMap<String, String>,
}

fn is_relaxed(code: &str, overrides: &Overrides) -> bool {
    if overrides.force {
        return true;
    }
    matches!(
        (code, overrides.skip_version, overrides.skip_components, overrides.skip_environment),
        ("downgrade", true, _, _) | ("upgrade_path", true, _, _) | ("components", _, true, _) | ("prerelease_in_production", _, _, true)
    )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CompatibilityGate;

impl CompatibilityGate {
    /// Run the nine ordered checks (plus the supplemental component-
    /// availability check implied by `required_components`) and return the
    /// aggregate result.
    pub fn evaluate(
        &self,
        current: &BundleVersion,
        target: &BundleVersion,
        env: &DetectedEnvironment,
        config: &CompatibilityConfig,
        overrides: &Overrides,
    ) -> GateResult {
        let mut issues = Vec::new();
        let mut metadata = BTreeMap::new();

        // 1. Downgrade.
        if target < current && !config.allow_downgrade {
            issues.push(Issue::new(
                Severity::Error,
                true,
                "downgrade",
                format!("target version {target} is older than installed version {current}"),
            ));
        }

        // 2. Prerelease in production.
        if target.is_prerelease() && env.environment == "production" && !config.allow_prerelease {
            issues.push(Issue::new(
                Severity::Error,
                true,
                "prerelease_in_production",
                format!("target version {target} is a prerelease and environment is production"),
            ));
        }

        // 3. Major bump, informational, never overrideable.
        if target.major() != current.major() {
            issues.push(Issue::new(
                Severity::Warning,
                false,
                "major_bump",
                format!(
                    "major version change from {} to {} may require migration",
                    current.major(),
                    target.major()
                ),
            ));
        }

        // 4. Upgrade path.
        let direct = current.same_minor(target) || current.is_next_minor(target);
        if !direct {
            let matched = config
                .upgrade_paths
                .iter()
                .find(|p| pattern_matches(&p.from_pattern, current) && pattern_matches(&p.to_pattern, target));
            match matched {
                Some(path) if !path.direct => {
                    let intermediate = path.intermediate.clone().unwrap_or_default();
                    metadata.insert("upgrade_path_action".to_string(), intermediate.clone());
                    issues.push(Issue::new(
                        Severity::Error,
                        true,
                        "upgrade_path",
                        format!("upgrade from {current} to {target} is not direct; upgrade to {intermediate} first"),
                    ));
                }
                Some(_) => {}
                None => {
                    issues.push(Issue::new(
                        Severity::Error,
                        true,
                        "upgrade_path",
                        format!("no declared upgrade path from {current} to {target}"),
                    ));
                }
            }
        }

        // 5. Platform, non-overrideable beyond `force`.
        let platform_ok = config
            .supported_platforms
            .iter()
            .any(|(os, arch)| os == &env.os && arch == &env.arch);
        if !config.supported_platforms.is_empty() && !platform_ok {
            issues.push(Issue::new(
                Severity::Error,
                false,
                "platform",
                format!("platform ({}, {}) is not supported", env.os, env.arch),
            ));
        }

        // 6. Disk, non-overrideable beyond `force`.
        if env.available_disk_bytes < config.min_disk_bytes {
            issues.push(Issue::new(
                Severity::Error,
                false,
                "disk",
                format!(
                    "available disk {} bytes is below the required {} bytes",
                    env.available_disk_bytes, config.min_disk_bytes
                ),
            ));
        }

        // 7. Memory, warning only.
        if env.available_memory_bytes < config.min_memory_bytes {
            issues.push(Issue::new(
                Severity::Warning,
                false,
                "memory",
                format!(
                    "available memory {} bytes is below the recommended {} bytes",
                    env.available_memory_bytes, config.min_memory_bytes
                ),
            ));
        }

        // 8. Deprecated features in target.
        if let Some(features) = config.deprecated_features.get(target.as_str().as_str()) {
            for feature in features {
                issues.push(Issue::new(
                    Severity::Warning,
                    false,
                    "deprecated_feature",
                    format!("feature {feature:?} is deprecated in {target}"),
                ));
            }
        }

        // 9. Known breaking changes between majors.
        if let Some(change) = config
            .breaking_changes
            .iter()
            .find(|c| c.from_major == current.major() && c.to_major == target.major())
        {
            issues.push(Issue::new(
                Severity::Warning,
                false,
                "breaking_change",
                format!(
                    "breaking changes between major {} and {}; see {}",
                    current.major(),
                    target.major(),
                    change.migration_guide
                ),
            ));
        }

        // Supplemental: required component availability (input declared by
        // spec §4.8 but not enumerated among the nine checks; treated here
        // as a tenth, `skip_components`-relaxable check — see DESIGN.md).
        let missing_components: Vec<&String> = config
            .required_components
            .iter()
            .filter(|c| !env.available_components.contains(c))
            .collect();
        if !missing_components.is_empty() {
            issues.push(Issue::new(
                Severity::Error,
                true,
                "components",
                format!("missing required components: {missing_components:?}"),
            ));
        }

        let warnings: Vec<Issue> = issues
            .iter()
            .filter(|i| i.severity != Severity::Error)
            .cloned()
            .collect();

        let compatible = !issues
            .iter()
            .any(|i| i.severity == Severity::Error && !is_relaxed(&i.code, overrides));

        GateResult {
            compatible,
            issues,
            warnings,
            metadata,
        }
    }
}
