//! `StructureValidator` (C7): directory-structure checking against a data,
//! not code, schema (spec §4.7).
//!
//! Defaults are built with a `fn default_schema()` constructor the way
//! `bundle_core::config::CoreConfig::default()` builds its defaults, so
//! that adding a content category is a schema edit, not a code change.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{PolicyError, PolicyResult};

/// A named naming convention enforced on filenames. Unknown names are
/// accepted unconditionally (spec §4.7: "Unknown conventions are treated
/// as 'accept'").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingConvention {
    LowercaseWithHyphens,
    ToolVersionOsArch,
    Accept,
}

impl NamingConvention {
    pub fn parse(name: &str) -> Self {
        match name {
            "lowercase-with-hyphens" => Self::LowercaseWithHyphens,
            "tool-vX.Y.Z-OS-ARCH" => Self::ToolVersionOsArch,
            _ => Self::Accept,
        }
    }

    fn pattern(&self) -> Option<Regex> {
        match self {
            Self::LowercaseWithHyphens => {
                Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*(\.[a-z0-9]+)?$").ok()
            }
            Self::ToolVersionOsArch => {
                Regex::new(r"^[a-z0-9][a-z0-9-]*-v\d+\.\d+\.\d+-[a-z0-9]+-[a-z0-9]+(\.[a-z0-9]+)?$")
                    .ok()
            }
            Self::Accept => None,
        }
    }

    pub fn matches(&self, filename: &str) -> bool {
        match self.pattern() {
            Some(re) => re.is_match(filename),
            None => true,
        }
    }
}

/// One node of the directory schema tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub naming_convention: Option<String>,
    #[serde(default)]
    pub children: Vec<DirectorySpec>,
}

impl DirectorySpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            allowed_extensions: None,
            naming_convention: None,
            children: Vec::new(),
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.allowed_extensions = Some(extensions.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_naming_convention(mut self, convention: impl Into<String>) -> Self {
        self.naming_convention = Some(convention.into());
        self
    }
}

/// The full schema: top-level entries under a bundle root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureSchema {
    pub entries: Vec<DirectorySpec>,
}

/// The default schema for offline distribution bundles: `templates/`,
/// `documentation/`, `signatures/`, `manifest.json` and `README.md` are
/// required; `modules/`, `binary/`, `resources/`, `config/` and
/// `compliance/` are optional.
pub fn default_schema() -> StructureSchema {
    StructureSchema {
        entries: vec![
            DirectorySpec::required("templates").with_naming_convention("lowercase-with-hyphens"),
            DirectorySpec::required("documentation").with_extensions(&["md", "pdf", "html"]),
            DirectorySpec::required("signatures"),
            DirectorySpec::required("manifest.json"),
            DirectorySpec::required("README.md"),
            DirectorySpec::optional("modules")
                .with_extensions(&["wasm", "so", "dll"])
                .with_naming_convention("tool-vX.Y.Z-OS-ARCH"),
            DirectorySpec::optional("binary"),
            DirectorySpec::optional("resources"),
            DirectorySpec::optional("config").with_extensions(&["json", "yaml", "yml", "toml"]),
            DirectorySpec::optional("compliance").with_extensions(&["json", "md", "pdf"]),
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Fatal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureIssue {
    pub severity: IssueSeverity,
    pub path: String,
    pub message: String,
}

/// Validate `root` against `schema`, returning every issue found. Callers
/// decide whether any [`IssueSeverity::Fatal`] issue aborts the operation.
pub fn validate_structure(schema: &StructureSchema, root: &Path) -> PolicyResult<Vec<StructureIssue>> {
    let mut issues = Vec::new();
    let known_names: std::collections::BTreeSet<&str> =
        schema.entries.iter().map(|e| e.name.as_str()).collect();

    for spec in &schema.entries {
        let entry_path = root.join(&spec.name);
        if !entry_path.exists() {
            if spec.required {
                issues.push(StructureIssue {
                    severity: IssueSeverity::Fatal,
                    path: spec.name.clone(),
                    message: format!("required entry {:?} is missing", spec.name),
                });
            }
            continue;
        }
        if entry_path.is_dir() {
            issues.extend(validate_directory_contents(spec, &entry_path)?);
        }
    }

    let dir_entries = std::fs::read_dir(root)
        .map_err(|e| PolicyError::Structure(format!("reading bundle root: {e}")))?;
    for entry in dir_entries {
        let entry = entry.map_err(|e| PolicyError::Structure(format!("reading entry: {e}")))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !known_names.contains(name.as_str()) {
            issues.push(StructureIssue {
                severity: IssueSeverity::Warning,
                path: name.clone(),
                message: format!("unexpected top-level entry {name:?}"),
            });
        }
    }

    Ok(issues)
}

fn validate_directory_contents(spec: &DirectorySpec, dir: &Path) -> PolicyResult<Vec<StructureIssue>> {
    let mut issues = Vec::new();
    let convention = spec
        .naming_convention
        .as_deref()
        .map(NamingConvention::parse)
        .unwrap_or(NamingConvention::Accept);

    let entries = std::fs::read_dir(dir)
        .map_err(|e| PolicyError::Structure(format!("reading {:?}: {e}", dir)))?;
    for entry in entries {
        let entry = entry.map_err(|e| PolicyError::Structure(format!("reading entry: {e}")))?;
        if entry.path().is_dir() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        let rel_path = format!("{}/{}", spec.name, filename);

        if let Some(allowed) = &spec.allowed_extensions {
            let ext = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
                issues.push(StructureIssue {
                    severity: IssueSeverity::Warning,
                    path: rel_path.clone(),
                    message: format!("extension {ext:?} is not one of {allowed:?}"),
                });
            }
        }

        if !convention.matches(&filename) {
            issues.push(StructureIssue {
                severity: IssueSeverity::Warning,
                path: rel_path,
                message: format!(
                    "filename {filename:?} does not match naming convention {:?}",
                    spec.naming_convention
                ),
            });
        }
    }
    Ok(issues)
}
