//! Ledger error types.

use thiserror::Error;

/// Errors from ledger mutations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("insufficient resources on agent {agent}: requested {requested}, available {available}")]
    Insufficient {
        agent: String,
        requested: String,
        available: String,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;
