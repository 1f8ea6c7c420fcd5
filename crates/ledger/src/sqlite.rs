//! SQLite ledger store
//!
//! Entries live in the `ledgers` table. Decimals are stored as TEXT so the
//! signed contributions sum exactly. Rows are never removed; deletion only
//! stamps `deleted_at`.

use crate::entry::{EntryType, LedgerEntry};
use crate::store::{ensure_distinct_ids, LedgerStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Table holding ledger entries
pub const LEDGER_TABLE: &str = "ledgers";

/// Secondary indexes on `ledgers`: (name, columns)
pub const LEDGER_INDEXES: [(&str, &str); 3] = [
    ("idx_ledgers_account_created", "account_id, created_at DESC"),
    ("idx_ledgers_transaction", "transaction_id"),
    ("idx_ledgers_type_account", "entry_type, account_id"),
];

/// Row type for the `ledgers` table
#[derive(Debug, Clone, sqlx::FromRow)]
struct LedgerRow {
    id: String,
    account_id: String,
    transaction_id: String,
    entry_type: String,
    amount: String,  // Decimal stored as TEXT
    balance: String, // Decimal stored as TEXT
    currency: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let entry_type = EntryType::parse(&row.entry_type)
            .ok_or_else(|| StoreError::Other(format!("invalid entry type: {}", row.entry_type)))?;

        Ok(LedgerEntry {
            amount: parse_decimal(&row.amount)?,
            balance: parse_decimal(&row.balance)?,
            id: row.id,
            account_id: row.account_id,
            transaction_id: row.transaction_id,
            entry_type,
            currency: row.currency,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn parse_decimal(value: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(value).map_err(|e| StoreError::Other(format!("invalid decimal {value}: {e}")))
}

/// Classify sqlx failures so the writer knows what to retry
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(err.to_string()),
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StoreError::Network(err.to_string())
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateKey(err.to_string())
        }
        // SQLITE_BUSY / SQLITE_LOCKED and their extended codes
        sqlx::Error::Database(db)
            if db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .is_some_and(|code| matches!(code & 0xff, 5 | 6)) =>
        {
            StoreError::Timeout(err.to_string())
        }
        _ => StoreError::Other(err.to_string()),
    }
}

/// Ledger store on a SQLite database. Clones share the pool.
#[derive(Clone)]
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    /// Open a pool for the given SQLite URL and create the table
    pub async fn connect(db_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(db_url)
            .map_err(store_error)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .map_err(store_error)?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Use an existing pool, e.g. the relational store's. Call `migrate` once.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `ledgers` table and its indexes if they do not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                transaction_id TEXT NOT NULL,
                entry_type TEXT NOT NULL,
                amount TEXT NOT NULL,
                balance TEXT NOT NULL,
                currency TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )
            "#
        ))
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        for (name, columns) in LEDGER_INDEXES {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {name} ON {LEDGER_TABLE}({columns})"
            ))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn insert_entries(&self, entries: &[LedgerEntry]) -> Result<usize, StoreError> {
        ensure_distinct_ids(entries)?;

        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(store_error)?;

        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO ledgers
                    (id, account_id, transaction_id, entry_type, amount, balance,
                     currency, description, created_at, updated_at, deleted_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(&entry.account_id)
            .bind(&entry.transaction_id)
            .bind(entry.entry_type.as_str())
            .bind(entry.amount.to_string())
            .bind(entry.balance.to_string())
            .bind(&entry.currency)
            .bind(&entry.description)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .bind(entry.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(store_error)?;
        Ok(inserted)
    }

    async fn entries_by_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT * FROM ledgers
            WHERE account_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn entries_by_type(
        &self,
        entry_type: EntryType,
        account_id: &str,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT * FROM ledgers
            WHERE entry_type = ? AND account_id = ? AND deleted_at IS NULL
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(entry_type.as_str())
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn entries_by_transaction(&self, transaction_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT * FROM ledgers
            WHERE transaction_id = ?
            ORDER BY CASE entry_type WHEN 'debit' THEN 0 ELSE 1 END
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn account_balance(&self, account_id: &str) -> Result<Decimal, StoreError> {
        let balances: Vec<String> = sqlx::query_scalar(
            "SELECT balance FROM ledgers WHERE account_id = ? AND deleted_at IS NULL",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        balances
            .iter()
            .map(|b| parse_decimal(b))
            .sum::<Result<Decimal, StoreError>>()
    }

    async fn soft_delete(&self, entry_id: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE ledgers SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            let exists: Option<String> = sqlx::query_scalar("SELECT id FROM ledgers WHERE id = ?")
                .bind(entry_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;
            if exists.is_none() {
                return Err(StoreError::NotFound(entry_id.to_string()));
            }
        }
        Ok(())
    }
}
