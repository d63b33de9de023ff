//! bundle-core
//!
//! Core primitives for the offline distribution bundle engine:
//! - Canonical JSON encoding used as hashing/signing input
//! - Streaming SHA-256 hashing
//! - Ed25519 signing/verification with key-id addressing
//! - The bundle/content/delta data model and its validation rules
//! - An explicit `Context` (clock, rng, audit sink, filesystem root)
//!   threaded through every component in this workspace instead of any
//!   package-global state

pub mod canonical;
pub mod config;
pub mod context;
pub mod determinism;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod manifest_store;
pub mod model;
pub mod path;
pub mod sign;
pub mod timestamp;
pub mod version;

pub use crate::context::Context;
pub use crate::errors::{BundleError, BundleResult};
pub use crate::hash::Sha256Hex;
pub use crate::path::ArtifactPath;
pub use crate::version::BundleVersion;

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::canonical::{to_canonical_bytes, to_canonical_string};
    pub use crate::context::{AuditEvent, AuditSink, Clock, Context, Rng};
    pub use crate::errors::{BundleError, BundleResult, Severity};
    pub use crate::hash::{format_digest, hash_bytes, hash_canonical, hash_reader};
    pub use crate::keys::KeyRing;
    pub use crate::model::{BundleManifest, ContentItem, DeltaManifest, Operation, SignatureEnvelope};
    pub use crate::path::ArtifactPath;
    pub use crate::sign::{generate_keypair, sign_manifest, verify_manifest};
    pub use crate::version::BundleVersion;
}
