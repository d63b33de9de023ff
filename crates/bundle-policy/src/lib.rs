//! Bundle directory structure validation (C7) and install-time
//! compatibility gating (C8) for offline distribution bundles.

pub mod compat;
pub mod errors;
pub mod schema;

pub mod prelude {
    pub use crate::compat::{
        BreakingChange, CompatibilityConfig, CompatibilityGate, DetectedEnvironment, GateResult,
        Issue, Overrides, Severity, UpgradePath,
    };
    pub use crate::errors::{PolicyError, PolicyResult};
    pub use crate::schema::{
        default_schema, validate_structure, DirectorySpec, IssueSeverity, NamingConvention,
        StructureIssue, StructureSchema,
    };
}
