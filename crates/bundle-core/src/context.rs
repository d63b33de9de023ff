//! Explicit execution context threaded through every component.
//!
//! The source this system replaces a package-global logger and ambient
//! clock/rng with an explicit [`Context`], the same way
//! `signia-core::pipeline::PipelineContext` threads diagnostics explicitly
//! instead of reaching for a global. No component in this workspace should
//! call `SystemTime::now()`, `rand::thread_rng()`, or a global logging macro
//! directly; everything goes through `Context`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;

/// A deterministic clock abstraction. Production code backs this with the
/// system clock; tests back it with a fixed or stepped value.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// An injectable source of randomness, so key generation and nonce/salt
/// selection stay testable.
pub trait Rng: Send + Sync {
    fn fill_bytes(&self, buf: &mut [u8]);
}

/// The system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRng;

impl Rng for SystemRng {
    fn fill_bytes(&self, buf: &mut [u8]) {
        use rand::RngCore;
        rand::rngs::OsRng.fill_bytes(buf);
    }
}

/// One structured audit event. Field names match the wire contract in
/// spec §6 ("Audit log").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    pub component: String,
    pub bundle_id: Option<String>,
    pub user: Option<String>,
    pub status: String,
    pub details: serde_json::Value,
}

/// Cross-cutting audit sink. Implementations must not panic: a failure to
/// record an audit event is a warning, never a reason to abort the
/// operation being audited.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// An audit sink that discards everything. Used by default and in tests
/// that do not care about the audit trail.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

/// Shared execution context: logger span, audit sink, clock, rng, and the
/// filesystem root a component is allowed to touch.
///
/// `Context` is cheap to clone (everything inside is `Arc`-backed) and is
/// passed by value or shared reference through every operation in this
/// workspace.
#[derive(Clone)]
pub struct Context {
    clock: Arc<dyn Clock>,
    rng: Arc<dyn Rng>,
    audit: Arc<dyn AuditSink>,
    root: PathBuf,
}

impl Context {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            rng: Arc::new(SystemRng),
            audit: Arc::new(NullAuditSink),
            root: root.into(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: Arc<dyn Rng>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    pub fn fill_random(&self, buf: &mut [u8]) {
        self.rng.fill_bytes(buf)
    }

    pub fn audit(&self, event: AuditEvent) {
        tracing::debug!(event = %event.event, component = %event.component, status = %event.status, "audit");
        self.audit.record(event);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fixed_clock_is_stable() {
        let c = FixedClock(datetime!(2026-01-01 00:00:00 UTC));
        assert_eq!(c.now(), c.now());
    }

    #[test]
    fn context_defaults_to_null_audit() {
        let ctx = Context::new("/tmp");
        ctx.audit(AuditEvent {
            timestamp: "1970-01-01T00:00:00Z".into(),
            event: "test".into(),
            component: "test".into(),
            bundle_id: None,
            user: None,
            status: "ok".into(),
            details: serde_json::json!({}),
        });
    }
}
