//! Ledger entry writer
//!
//! Flow: Parse event → Build entry pair → Insert atomically (with retry)

use crate::entry::{entries_for_event, EntryType, LedgerEntry};
use crate::error::LedgerResult;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::store::LedgerStore;
use chrono::Utc;
use dbank_core::{CancelToken, TransactionEvent};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Materializes transaction events into the ledger
#[derive(Clone)]
pub struct LedgerWriter {
    store: Arc<dyn LedgerStore>,
    policy: RetryPolicy,
}

impl LedgerWriter {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Write the debit/credit pair for an event.
    ///
    /// Writing the same event twice leaves exactly one pair in the store.
    pub async fn write_event(
        &self,
        event: &TransactionEvent,
        cancel: &CancelToken,
    ) -> LedgerResult<[LedgerEntry; 2]> {
        let entries = entries_for_event(event, Utc::now())?;

        let inserted = retry_with_backoff(&self.policy, "insert ledger entries", cancel, |_| {
            self.store.insert_entries(&entries)
        })
        .await?;

        tracing::info!(
            transaction_id = %event.transaction_id,
            amount = %entries[1].amount,
            inserted,
            "ledger entries written"
        );
        Ok(entries)
    }

    pub async fn entries_by_account(&self, account_id: &str) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.store.entries_by_account(account_id).await?)
    }

    /// Debits or credits of one account, newest first
    pub async fn entries_by_type(
        &self,
        entry_type: EntryType,
        account_id: &str,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.store.entries_by_type(entry_type, account_id).await?)
    }

    pub async fn entries_by_transaction(&self, transaction_id: &str) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.store.entries_by_transaction(transaction_id).await?)
    }

    pub async fn account_balance(&self, account_id: &str) -> LedgerResult<Decimal> {
        Ok(self.store.account_balance(account_id).await?)
    }

    pub async fn soft_delete(&self, entry_id: &str) -> LedgerResult<()> {
        self.store.soft_delete(entry_id).await?;
        tracing::info!(entry_id, "ledger entry soft-deleted");
        Ok(())
    }
}
