//! Repository implementations for SQLite
//!
//! Account and transaction queries. Every function takes any SQLite executor so
//! the same query runs against the pool or inside an open transaction.

use crate::error::{PersistenceError, PersistenceResult};
use crate::schema::{AccountRow, TransactionRow};
use chrono::Utc;
use dbank_core::{Account, AccountStatus, TransactionRecord, TransactionStatus};
use sqlx::SqliteExecutor;

// ============================================================================
// Account Repository
// ============================================================================

/// Repository for the accounts table
pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account
    pub async fn insert<'e>(executor: impl SqliteExecutor<'e>, account: &Account) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_id, name, currency, balance, status, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.owner_id)
        .bind(&account.name)
        .bind(&account.currency)
        .bind(account.balance.to_string())
        .bind(account.status.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.deleted_at)
        .execute(executor)
        .await
        .map_err(|e| PersistenceError::from_insert(e, "Account", &account.id))?;
        Ok(())
    }

    /// Fetch the raw row of a live (not soft-deleted) account
    pub async fn get_row<'e>(executor: impl SqliteExecutor<'e>, id: &str) -> PersistenceResult<AccountRow> {
        sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Account", id))
    }

    /// Fetch a live account by ID
    pub async fn get_by_id<'e>(executor: impl SqliteExecutor<'e>, id: &str) -> PersistenceResult<Account> {
        Self::get_row(executor, id).await?.try_into()
    }

    /// Live accounts in creation order, one page at a time (`page` starts at 1)
    pub async fn list<'e>(
        executor: impl SqliteExecutor<'e>,
        page: u32,
        page_size: u32,
    ) -> PersistenceResult<Vec<Account>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT * FROM accounts
            WHERE deleted_at IS NULL
            ORDER BY created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    /// Rename an account
    pub async fn update_name<'e>(executor: impl SqliteExecutor<'e>, id: &str, name: &str) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET name = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }

    /// Update lifecycle status
    pub async fn update_status<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
        status: AccountStatus,
    ) -> PersistenceResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }

    /// Soft delete: the row stays for history but is no longer visible
    pub async fn soft_delete<'e>(executor: impl SqliteExecutor<'e>, id: &str) -> PersistenceResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE accounts SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Account", id));
        }
        Ok(())
    }
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Repository for the transactions table
pub struct TransactionRepo;

impl TransactionRepo {
    /// Insert a transaction record
    pub async fn insert<'e>(
        executor: impl SqliteExecutor<'e>,
        record: &TransactionRecord,
    ) -> PersistenceResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, from_account_id, to_account_id, transaction_type, amount, currency, description, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.from_account_id)
        .bind(&record.to_account_id)
        .bind(&record.transaction_type)
        .bind(record.amount.to_string())
        .bind(&record.currency)
        .bind(&record.description)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(executor)
        .await
        .map_err(|e| PersistenceError::from_insert(e, "Transaction", &record.id))?;
        Ok(())
    }

    /// Fetch a transaction by ID
    pub async fn get_by_id<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> PersistenceResult<TransactionRecord> {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Transaction", id))?
            .try_into()
    }

    /// Transactions where the account is sender or receiver, newest first
    pub async fn get_by_account<'e>(
        executor: impl SqliteExecutor<'e>,
        account_id: &str,
    ) -> PersistenceResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE from_account_id = ? OR to_account_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .bind(account_id)
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    /// Transactions with the given status, oldest first
    pub async fn get_by_status<'e>(
        executor: impl SqliteExecutor<'e>,
        status: TransactionStatus,
    ) -> PersistenceResult<Vec<TransactionRecord>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE status = ? ORDER BY created_at ASC",
        )
        .bind(status.as_str())
        .fetch_all(executor)
        .await?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }
}
