//! # Persistence Errors
//!
//! Error types for the relational store, wrapping sqlx errors and the
//! rejections raised inside the transfer unit.

use rust_decimal::Decimal;
use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    // === Database errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Record already exists: {entity} with id {id}")]
    AlreadyExists { entity: String, id: String },

    // === Transfer unit rejections ===
    #[error("Insufficient balance in account {account_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        account_id: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Account {0} is closed or deleted")]
    AccountUnavailable(String),

    #[error("Account {0} was modified concurrently")]
    ConcurrentUpdate(String),

    // === Conversion errors ===
    #[error("Invalid decimal value: {0}")]
    InvalidDecimal(String),

    #[error("Invalid enum value: {field} = {value}")]
    InvalidEnumValue { field: String, value: String },
}

/// Result type alias for PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &str, id: &str) -> Self {
        Self::AlreadyExists {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Map a unique-constraint violation on insert to `AlreadyExists`
    pub(crate) fn from_insert(err: sqlx::Error, entity: &str, id: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::already_exists(entity, id)
            }
            _ => Self::Database(err),
        }
    }
}
