//! Reconciliation between account balances and the ledger

use crate::error::ServiceError;
use crate::service::{AccountService, TransactionService};
use dbank_core::TransactionStatus;
use dbank_ledger::LedgerWriter;
use rust_decimal::Decimal;
use serde::Serialize;

/// Relational balance against ledger net balance for one account.
///
/// Ledger entries only cover transfers, so `opening_balance` is what the
/// account held before its first ledgered transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub account_id: String,
    pub currency: String,
    pub account_balance: Decimal,
    pub ledger_balance: Decimal,
    pub opening_balance: Decimal,
    pub successful_transactions: usize,
    /// Successful transactions whose entry pair is not in the ledger yet
    pub missing_ledger_entries: Vec<String>,
    pub consistent: bool,
}

#[derive(Clone)]
pub struct Reconciler {
    accounts: AccountService,
    transactions: TransactionService,
    ledger: LedgerWriter,
}

impl Reconciler {
    pub fn new(accounts: AccountService, transactions: TransactionService, ledger: LedgerWriter) -> Self {
        Self {
            accounts,
            transactions,
            ledger,
        }
    }

    /// Republish the success event of every committed transfer whose entry
    /// pair is not in the ledger, e.g. events lost with the broker queue on a
    /// restart. Run once the relay is consuming. Returns the replayed ids.
    pub async fn replay_missing(&self) -> Result<Vec<String>, ServiceError> {
        let mut replayed = Vec::new();
        for record in self.transactions.successful_transactions().await? {
            // Soft-deleted entries count: the pair was written once
            if self.ledger.entries_by_transaction(&record.id).await?.len() == 2 {
                continue;
            }
            if self.transactions.republish(&record).await {
                replayed.push(record.id);
            }
        }

        if !replayed.is_empty() {
            tracing::warn!(count = replayed.len(), "replayed transfers missing from the ledger");
        }
        Ok(replayed)
    }

    pub async fn reconcile(&self, account_id: &str) -> Result<ReconciliationReport, ServiceError> {
        let account = self.accounts.get_account(account_id).await?;
        let transactions = self.accounts.account_transactions(account_id).await?;
        let ledger_balance = self.ledger.account_balance(account_id).await?;

        let mut successful = 0;
        let mut missing = Vec::new();
        for record in transactions.iter().filter(|t| t.status == TransactionStatus::Success) {
            successful += 1;
            let entries = self.ledger.entries_by_transaction(&record.id).await?;
            if entries.iter().filter(|e| !e.is_deleted()).count() != 2 {
                missing.push(record.id.clone());
            }
        }

        let consistent = missing.is_empty();
        if !consistent {
            tracing::warn!(
                account_id,
                missing = missing.len(),
                "ledger is behind the relational store"
            );
        }

        Ok(ReconciliationReport {
            account_id: account.id,
            currency: account.currency,
            account_balance: account.balance,
            ledger_balance,
            opening_balance: account.balance - ledger_balance,
            successful_transactions: successful,
            missing_ledger_entries: missing,
            consistent,
        })
    }
}
