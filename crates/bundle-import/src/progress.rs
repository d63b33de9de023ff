//! Progress reporting for the staged importer, generalizing
//! `signia-core::pipeline::PipelineDiagnostic`'s level+code+message+data
//! shape from a single compile pass to the six import phases.

use std::collections::BTreeMap;

use crate::phases::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// One progress/diagnostic event, advisory only: a sink that drops events
/// under backpressure must not affect the import's outcome.
#[derive(Debug, Clone)]
pub struct ImportEvent {
    pub level: EventLevel,
    pub phase: Phase,
    /// Progress within this phase's own share, `0..=100`.
    pub percent: u8,
    pub code: String,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

impl ImportEvent {
    pub fn info(phase: Phase, percent: u8, code: &str, message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Info,
            phase,
            percent: percent.min(100),
            code: code.to_string(),
            message: message.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn warning(phase: Phase, code: &str, message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Warning,
            phase,
            percent: 100,
            code: code.to_string(),
            message: message.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn error(phase: Phase, code: &str, message: impl Into<String>) -> Self {
        Self {
            level: EventLevel::Error,
            phase,
            percent: 0,
            code: code.to_string(),
            message: message.into(),
            data: BTreeMap::new(),
        }
    }
}

/// Receives `ImportEvent`s as they're produced. Implementations must not
/// panic and should treat delivery as best-effort.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: ImportEvent);
}

/// A sink that discards every event. Used when the caller has no UI to
/// drive.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_event(&self, _event: ImportEvent) {}
}
