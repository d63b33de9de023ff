//! The fixed six-phase state machine (spec §4.11): `Idle -> Validating ->
//! Extracting -> BackingUp -> Verifying -> Installing -> Cleaning ->
//! {Succeeded|Failed|Cancelled}`, with a `RollingBack` transitional state
//! entered whenever installation has begun when an error or cancel occurs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validation,
    Extraction,
    Backup,
    Verification,
    Installation,
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Validating,
    Extracting,
    BackingUp,
    Verifying,
    Installing,
    Cleaning,
    RollingBack,
    Succeeded,
    Failed,
    Cancelled,
}

impl ImportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportState::Succeeded | ImportState::Failed | ImportState::Cancelled)
    }
}

/// A cooperative cancellation flag, checked between phases and between
/// per-file operations in Installation and Backup (spec §5 "Suspension
/// points").
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
