//! bundle-delta
//!
//! Delta generation, update planning, backup/rollback, and conflict
//! resolution for upgrading an installed offline distribution bundle
//! to a newer version without re-shipping the whole archive.

pub mod apply;
pub mod backup;
pub mod conflict;
pub mod errors;
pub mod generate;
pub mod plan;

pub mod prelude {
    pub use crate::apply::apply_operations;
    pub use crate::backup::{create_backup, rollback, BackupEntry, BackupManifest};
    pub use crate::conflict::{Conflict, ConflictKind, ConflictResolver, Resolution, ResolutionStrategy};
    pub use crate::errors::{DeltaError, DeltaResult};
    pub use crate::generate::generate_delta;
    pub use crate::plan::{plan_update, OpKind, PlannedOperation, UpdatePlan};
}
