//! Transfer errors

use dbank_core::AmountError;
use dbank_persistence::PersistenceError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Status code reported to RPC callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Internal => "Internal",
        };
        write!(f, "{}", s)
    }
}

/// Errors that can occur while executing a transfer
#[derive(Debug, Error)]
pub enum TransferError {
    // === Validation ===
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("from and to account cannot be the same")]
    SameAccount,

    #[error("insufficient balance in account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        account_id: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("account {0} is closed or deleted")]
    AccountUnavailable(String),

    #[error("account {account_id} holds {expected}, transfer is in {actual}")]
    CurrencyMismatch {
        account_id: String,
        expected: String,
        actual: String,
    },

    // === Lookup ===
    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    // === Infrastructure ===
    #[error("failed to {operation}: {source}")]
    Internal {
        operation: &'static str,
        #[source]
        source: PersistenceError,
    },
}

impl TransferError {
    /// RPC status code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TransferError::MissingField(_)
            | TransferError::InvalidAmount(_)
            | TransferError::SameAccount
            | TransferError::InsufficientFunds { .. }
            | TransferError::AccountUnavailable(_)
            | TransferError::CurrencyMismatch { .. } => ErrorCode::InvalidArgument,
            TransferError::AccountNotFound(_) | TransferError::TransactionNotFound(_) => {
                ErrorCode::NotFound
            }
            TransferError::Internal { .. } => ErrorCode::Internal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code() == ErrorCode::InvalidArgument
    }

    /// Classify a persistence failure raised while running `operation`
    pub(crate) fn from_persistence(operation: &'static str, err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } if entity == "Account" => {
                TransferError::AccountNotFound(id)
            }
            PersistenceError::NotFound { entity, id } if entity == "Transaction" => {
                TransferError::TransactionNotFound(id)
            }
            PersistenceError::InsufficientFunds {
                account_id,
                available,
                requested,
            } => TransferError::InsufficientFunds {
                account_id,
                available,
                requested,
            },
            PersistenceError::AccountUnavailable(id) => TransferError::AccountUnavailable(id),
            source => TransferError::Internal { operation, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_codes() {
        assert_eq!(TransferError::SameAccount.code(), ErrorCode::InvalidArgument);
        assert_eq!(
            TransferError::AccountNotFound("x".into()).code(),
            ErrorCode::NotFound
        );
        let internal = TransferError::from_persistence(
            "commit transfer",
            PersistenceError::ConcurrentUpdate("A".into()),
        );
        assert_eq!(internal.code(), ErrorCode::Internal);
        assert!(internal.to_string().starts_with("failed to commit transfer"));
    }

    #[test]
    fn test_persistence_rejections_stay_validation_errors() {
        let err = TransferError::from_persistence(
            "commit transfer",
            PersistenceError::InsufficientFunds {
                account_id: "A".into(),
                available: dec!(10),
                requested: dec!(40),
            },
        );
        assert!(err.is_validation());

        let err = TransferError::from_persistence(
            "load account",
            PersistenceError::not_found("Account", "A"),
        );
        assert!(matches!(err, TransferError::AccountNotFound(id) if id == "A"));
    }
}
