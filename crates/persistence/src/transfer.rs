//! The transfer unit: both balance changes and the transaction record commit
//! or roll back together.

use crate::error::{PersistenceError, PersistenceResult};
use crate::repos::{AccountRepo, TransactionRepo};
use crate::schema::{parse_decimal, AccountRow};
use chrono::{DateTime, Utc};
use dbank_core::{AccountStatus, TransactionRecord, TransactionStatus};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

/// A validated transfer ready to be applied
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub transaction_id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub transaction_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
}

impl NewTransfer {
    /// The record written when the transfer commits
    pub fn record(&self, status: TransactionStatus, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            id: self.transaction_id.clone(),
            from_account_id: self.from_account_id.clone(),
            to_account_id: self.to_account_id.clone(),
            transaction_type: self.transaction_type.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            description: self.description.clone(),
            status,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Apply a transfer as one atomic unit.
///
/// The unit takes the write lock up front (`BEGIN IMMEDIATE`), so concurrent
/// units queue on the busy timeout instead of failing a shared-to-write lock
/// upgrade. Balances are re-read and re-validated under that lock. The sender
/// debit stays conditional on the observed balance; the receiver credit only
/// requires the account to still be live.
pub async fn apply_transfer(
    pool: &SqlitePool,
    transfer: &NewTransfer,
) -> PersistenceResult<TransactionRecord> {
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    let sender = AccountRepo::get_row(&mut *tx, &transfer.from_account_id).await?;
    let receiver = AccountRepo::get_row(&mut *tx, &transfer.to_account_id).await?;
    ensure_transferable(&sender)?;
    ensure_transferable(&receiver)?;

    let sender_balance = parse_decimal(&sender.balance)?;
    let receiver_balance = parse_decimal(&receiver.balance)?;

    if sender_balance < transfer.amount {
        return Err(PersistenceError::InsufficientFunds {
            account_id: sender.id,
            available: sender_balance,
            requested: transfer.amount,
        });
    }

    let now = Utc::now();
    debit(&mut tx, &sender, sender_balance - transfer.amount, now).await?;
    credit(&mut tx, &receiver.id, receiver_balance + transfer.amount, now).await?;

    let record = transfer.record(TransactionStatus::Success, now);
    TransactionRepo::insert(&mut *tx, &record).await?;

    tx.commit().await?;

    tracing::info!(
        transaction_id = %record.id,
        from_account_id = %record.from_account_id,
        to_account_id = %record.to_account_id,
        amount = %record.amount,
        "transfer committed"
    );

    Ok(record)
}

fn ensure_transferable(row: &AccountRow) -> PersistenceResult<()> {
    if row.status != AccountStatus::Active.as_str() || row.deleted_at.is_some() {
        return Err(PersistenceError::AccountUnavailable(row.id.clone()));
    }
    Ok(())
}

async fn debit(
    conn: &mut SqliteConnection,
    observed: &AccountRow,
    new_balance: Decimal,
    now: DateTime<Utc>,
) -> PersistenceResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts SET balance = ?, updated_at = ?
        WHERE id = ? AND balance = ? AND status = 'active' AND deleted_at IS NULL
        "#,
    )
    .bind(new_balance.to_string())
    .bind(now)
    .bind(&observed.id)
    .bind(&observed.balance)
    .execute(&mut *conn)
    .await?;

    ensure_one_row(result.rows_affected(), &observed.id)
}

async fn credit(
    conn: &mut SqliteConnection,
    account_id: &str,
    new_balance: Decimal,
    now: DateTime<Utc>,
) -> PersistenceResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE accounts SET balance = ?, updated_at = ?
        WHERE id = ? AND status = 'active' AND deleted_at IS NULL
        "#,
    )
    .bind(new_balance.to_string())
    .bind(now)
    .bind(account_id)
    .execute(&mut *conn)
    .await?;

    ensure_one_row(result.rows_affected(), account_id)
}

fn ensure_one_row(rows_affected: u64, account_id: &str) -> PersistenceResult<()> {
    if rows_affected != 1 {
        return Err(PersistenceError::ConcurrentUpdate(account_id.to_string()));
    }
    Ok(())
}
