//! Exit-code-bearing CLI error taxonomy, matching the table in spec §6: most
//! failures are a plain I/O error (exit 1), but a handful of commands carry
//! a distinguished exit code a calling script can branch on.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("verification failed: {0}")]
    VerificationFailed(String),

    #[error("import blocked: {0}")]
    ImportBlocked(String),
}

impl CliError {
    /// `create`: 2 on invalid args. `verify`: 3 on mismatch. `import`: 3 on
    /// validation failure, 4 on unresolved conflict. Every other error
    /// (I/O, anything else) exits 1, handled by `main`'s fallback branch.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => 2,
            CliError::VerificationFailed(_) => 3,
            CliError::ImportBlocked(_) => 4,
        }
    }
}
