//! Database schema definitions
//!
//! Row types for sqlx mapping from the SQLite tables, plus the DDL.
//! Decimals are stored as TEXT so balances round-trip exactly.

use crate::error::{PersistenceError, PersistenceResult};
use chrono::{DateTime, Utc};
use dbank_core::{Account, AccountStatus, TransactionRecord, TransactionStatus};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;

/// Row type for the `accounts` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub currency: String,
    pub balance: String, // Decimal stored as TEXT
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Row type for the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub transaction_type: String,
    pub amount: String, // Decimal stored as TEXT
    pub currency: String,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create tables and indexes if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            currency TEXT NOT NULL,
            balance TEXT NOT NULL DEFAULT '0',
            status TEXT NOT NULL DEFAULT 'active',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            from_account_id TEXT NOT NULL REFERENCES accounts(id),
            to_account_id TEXT NOT NULL REFERENCES accounts(id),
            transaction_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_accounts_owner
        ON accounts(owner_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_from
        ON transactions(from_account_id, created_at)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_to
        ON transactions(to_account_id, created_at)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) fn parse_decimal(value: &str) -> PersistenceResult<Decimal> {
    Decimal::from_str(value).map_err(|e| PersistenceError::InvalidDecimal(format!("{value}: {e}")))
}

// === Conversion implementations ===

impl TryFrom<AccountRow> for Account {
    type Error = PersistenceError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let status =
            AccountStatus::parse(&row.status).ok_or_else(|| PersistenceError::InvalidEnumValue {
                field: "accounts.status".to_string(),
                value: row.status.clone(),
            })?;

        Ok(Account {
            balance: parse_decimal(&row.balance)?,
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            currency: row.currency,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = PersistenceError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let status = TransactionStatus::parse(&row.status).ok_or_else(|| {
            PersistenceError::InvalidEnumValue {
                field: "transactions.status".to_string(),
                value: row.status.clone(),
            }
        })?;

        Ok(TransactionRecord {
            amount: parse_decimal(&row.amount)?,
            id: row.id,
            from_account_id: row.from_account_id,
            to_account_id: row.to_account_id,
            transaction_type: row.transaction_type,
            currency: row.currency,
            description: row.description,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
