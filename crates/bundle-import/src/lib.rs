//! bundle-import
//!
//! The staged importer (C11): a fixed six-phase state machine that installs
//! an extracted, verified bundle into a target directory with backup and
//! rollback, plus the audit log sink and progress events it reports
//! through.

pub mod audit;
pub mod errors;
pub mod importer;
pub mod phases;
pub mod progress;

pub mod prelude {
    pub use crate::audit::NdjsonAuditSink;
    pub use crate::errors::{ImportError, ImportResult};
    pub use crate::importer::{ImportOptions, ImportReport, StagedImporter, ValidationLevel};
    pub use crate::phases::{CancellationToken, ImportState, Phase};
    pub use crate::progress::{EventLevel, ImportEvent, NullProgressSink, ProgressSink};
}
