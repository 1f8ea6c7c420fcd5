//! Ledger errors

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur while writing or reading ledger entries
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    // === Event validation (never retried) ===
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    // === Retry outcome ===
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    // === Store ===
    #[error("Ledger store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Whether the event itself is unusable, so redelivery cannot help
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_) | LedgerError::MissingField(_)
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
