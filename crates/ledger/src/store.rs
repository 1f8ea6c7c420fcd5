//! Document store interface for ledger entries

use crate::entry::{EntryType, LedgerEntry};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// Errors reported by a ledger store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("entry {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Network, timeout and duplicate-key failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Network(_) | StoreError::Timeout(_) | StoreError::DuplicateKey(_)
        )
    }
}

/// Reject a batch that carries the same entry id twice
pub(crate) fn ensure_distinct_ids(entries: &[LedgerEntry]) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.id.as_str()) {
            return Err(StoreError::Other(format!(
                "entry {} appears twice in one insert",
                entry.id
            )));
        }
    }
    Ok(())
}

/// Append-only store of ledger entries.
///
/// Implementations must make `insert_entries` all-or-nothing and skip
/// entries whose id is already stored.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert entries atomically, ignoring ids already present.
    /// Returns the number of entries actually inserted.
    async fn insert_entries(&self, entries: &[LedgerEntry]) -> Result<usize, StoreError>;

    /// Non-deleted entries of an account, newest first
    async fn entries_by_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Non-deleted entries of one side for an account, newest first
    async fn entries_by_type(
        &self,
        entry_type: EntryType,
        account_id: &str,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Entries of a transaction, deleted ones included
    async fn entries_by_transaction(&self, transaction_id: &str) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Sum of signed contributions over the account's non-deleted entries
    async fn account_balance(&self, account_id: &str) -> Result<Decimal, StoreError>;

    /// Mark an entry deleted
    async fn soft_delete(&self, entry_id: &str) -> Result<(), StoreError>;
}
