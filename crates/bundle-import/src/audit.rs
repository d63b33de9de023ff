//! Concrete audit log sink: append-only newline-delimited JSON, per spec §6
//! "Audit log".

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bundle_core::context::{AuditEvent, AuditSink};

/// Writes one JSON object per line to a file, opened in append mode.
/// A write failure is logged and otherwise swallowed: per
/// `bundle_core::context::AuditSink`'s contract, a failure to record an
/// audit event must never abort the operation being audited.
pub struct NdjsonAuditSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl NdjsonAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for NdjsonAuditSink {
    fn record(&self, event: AuditEvent) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize audit event");
                return;
            }
        };
        let file = OpenOptions::new().create(true).append(true).open(&self.path);
        match file {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{line}") {
                    tracing::warn!(error = %e, path = ?self.path, "failed to append audit event");
                }
            }
            Err(e) => tracing::warn!(error = %e, path = ?self.path, "failed to open audit log"),
        }
    }
}
