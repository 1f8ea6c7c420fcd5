//! Transfer executor
//!
//! Flow: Validate → Load accounts → Check funds → Commit unit

use crate::error::TransferError;
use crate::request::{TransferRequest, ValidTransfer};
use chrono::Utc;
use dbank_core::{Account, TransactionRecord, TransactionStatus};
use dbank_persistence::{apply_transfer, AccountRepo, Database, NewTransfer, TransactionRepo};
use uuid::Uuid;

/// Executes transfers against the relational store
#[derive(Clone)]
pub struct TransferExecutor {
    db: Database,
}

impl TransferExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate the request and build the transfer plan.
    ///
    /// Balances read here only allow an early rejection; the commit re-checks
    /// them inside the atomic unit.
    pub async fn prepare(&self, request: &TransferRequest) -> Result<NewTransfer, TransferError> {
        let valid = request.validate()?;

        let sender = self.load_account(&valid.from_account_id).await?;
        let receiver = self.load_account(&valid.to_account_id).await?;

        check_account(&sender, &valid)?;
        check_account(&receiver, &valid)?;

        if sender.balance < valid.amount.value() {
            return Err(TransferError::InsufficientFunds {
                account_id: sender.id,
                available: sender.balance,
                requested: valid.amount.value(),
            });
        }

        Ok(NewTransfer {
            transaction_id: Uuid::new_v4().to_string(),
            from_account_id: valid.from_account_id,
            to_account_id: valid.to_account_id,
            transaction_type: valid.transaction_type,
            amount: valid.amount.value(),
            currency: valid.currency,
            description: valid.description,
        })
    }

    /// Apply a prepared transfer as one atomic unit
    pub async fn commit(&self, plan: &NewTransfer) -> Result<TransactionRecord, TransferError> {
        apply_transfer(self.db.pool(), plan).await.map_err(|e| {
            let err = TransferError::from_persistence("commit transfer", e);
            if !err.is_validation() {
                tracing::error!(transaction_id = %plan.transaction_id, error = %err, "transfer unit rolled back");
            }
            err
        })
    }

    /// Prepare and commit in one call
    pub async fn execute(&self, request: &TransferRequest) -> Result<TransactionRecord, TransferError> {
        let plan = self.prepare(request).await?;
        self.commit(&plan).await
    }

    /// Record a plan whose unit failed, with status `failed` and no balance change
    pub async fn record_failed(&self, plan: &NewTransfer) -> Result<TransactionRecord, TransferError> {
        let record = plan.record(TransactionStatus::Failed, Utc::now());
        TransactionRepo::insert(self.db.pool(), &record)
            .await
            .map_err(|e| TransferError::from_persistence("record failed transfer", e))?;
        Ok(record)
    }

    /// Fetch a recorded transaction
    pub async fn get_transaction(&self, id: &str) -> Result<TransactionRecord, TransferError> {
        if id.trim().is_empty() {
            return Err(TransferError::MissingField("id"));
        }
        TransactionRepo::get_by_id(self.db.pool(), id)
            .await
            .map_err(|e| TransferError::from_persistence("get transaction", e))
    }

    /// All recorded transactions with the given status, oldest first
    pub async fn transactions_with_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<TransactionRecord>, TransferError> {
        TransactionRepo::get_by_status(self.db.pool(), status)
            .await
            .map_err(|e| TransferError::from_persistence("list transactions", e))
    }

    async fn load_account(&self, id: &str) -> Result<Account, TransferError> {
        AccountRepo::get_by_id(self.db.pool(), id).await.map_err(|e| {
            tracing::warn!(account_id = %id, error = %e, "failed to load account");
            TransferError::from_persistence("load account", e)
        })
    }
}

fn check_account(account: &Account, valid: &ValidTransfer) -> Result<(), TransferError> {
    if !account.is_transferable() {
        return Err(TransferError::AccountUnavailable(account.id.clone()));
    }
    if !account.currency.eq_ignore_ascii_case(&valid.currency) {
        return Err(TransferError::CurrencyMismatch {
            account_id: account.id.clone(),
            expected: account.currency.clone(),
            actual: valid.currency.clone(),
        });
    }
    Ok(())
}
