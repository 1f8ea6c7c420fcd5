//! Transaction orchestrator and account service

use crate::error::ServiceError;
use dbank_bus::EventPublisher;
use dbank_core::amount::MAX_SCALE;
use dbank_core::{Account, AccountStatus, TransactionEvent, TransactionRecord, TransactionStatus};
use dbank_persistence::{AccountRepo, Database, NewTransfer, TransactionRepo};
use dbank_transfer::{ErrorCode, TransferError, TransferExecutor, TransferRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// RPC-facing entry point for transfers. Holds no state of its own.
#[derive(Clone)]
pub struct TransactionService {
    executor: TransferExecutor,
    publisher: EventPublisher,
}

impl TransactionService {
    pub fn new(executor: TransferExecutor, publisher: EventPublisher) -> Self {
        Self { executor, publisher }
    }

    /// Execute a transfer, then publish its event.
    ///
    /// The event is published only after the commit and a publish failure
    /// does not fail the call. When the commit itself fails, a `failed`
    /// record is written and a failure event published, both best-effort.
    pub async fn create_transaction(
        &self,
        request: &TransferRequest,
    ) -> Result<TransactionRecord, TransferError> {
        let plan = self.executor.prepare(request).await?;

        match self.executor.commit(&plan).await {
            Ok(record) => {
                self.publisher
                    .publish_best_effort(&TransactionEvent::from_record(&record))
                    .await;
                Ok(record)
            }
            Err(err) if err.code() == ErrorCode::Internal => {
                self.record_failure(&plan).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_transaction(&self, id: &str) -> Result<TransactionRecord, TransferError> {
        self.executor.get_transaction(id).await
    }

    /// Committed transfers, oldest first
    pub async fn successful_transactions(&self) -> Result<Vec<TransactionRecord>, TransferError> {
        self.executor
            .transactions_with_status(TransactionStatus::Success)
            .await
    }

    /// Publish the event of an already recorded transaction again
    pub async fn republish(&self, record: &TransactionRecord) -> bool {
        self.publisher
            .publish_best_effort(&TransactionEvent::from_record(record))
            .await
    }

    async fn record_failure(&self, plan: &NewTransfer) {
        match self.executor.record_failed(plan).await {
            Ok(record) => {
                self.publisher
                    .publish_best_effort(&TransactionEvent::from_record(&record))
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    transaction_id = %plan.transaction_id,
                    error = %e,
                    "failed to record failed transfer"
                );
            }
        }
    }
}

/// Request body for opening an account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    pub currency: String,
    /// Opening balance, zero when empty
    #[serde(default)]
    pub balance: String,
}

/// Request body for renaming an account. Balance, currency and status only
/// change through transfers and lifecycle routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
}

/// Paging for account listings; `page` starts at 1
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One page of accounts
#[derive(Debug, Clone, Serialize)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: usize,
}

/// Thin account CRUD over the relational store
#[derive(Clone)]
pub struct AccountService {
    db: Database,
}

impl AccountService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_account(&self, request: &CreateAccountRequest) -> Result<Account, ServiceError> {
        let owner_id = request.owner_id.trim();
        let currency = request.currency.trim();
        if owner_id.is_empty() {
            return Err(ServiceError::InvalidArgument("owner_id is required".into()));
        }
        if currency.is_empty() {
            return Err(ServiceError::InvalidArgument("currency is required".into()));
        }

        let balance = match request.balance.trim() {
            "" => Decimal::ZERO,
            raw => Decimal::from_str(raw)
                .map_err(|_| ServiceError::InvalidArgument(format!("invalid balance: {raw}")))?,
        };
        if balance.is_sign_negative() || balance.scale() > MAX_SCALE {
            return Err(ServiceError::InvalidArgument(format!(
                "invalid opening balance: {balance}"
            )));
        }

        let id = match request.id.trim() {
            "" => Uuid::new_v4().to_string(),
            id => id.to_string(),
        };

        let account = Account::new(id, owner_id, currency.to_uppercase(), balance)
            .with_name(request.name.trim());
        AccountRepo::insert(self.db.pool(), &account)
            .await
            .map_err(ServiceError::persistence("create account"))?;

        tracing::info!(account_id = %account.id, currency = %account.currency, "account created");
        Ok(account)
    }

    pub async fn get_account(&self, id: &str) -> Result<Account, ServiceError> {
        AccountRepo::get_by_id(self.db.pool(), id)
            .await
            .map_err(ServiceError::persistence("get account"))
    }

    pub async fn list_accounts(&self, query: ListAccountsQuery) -> Result<AccountPage, ServiceError> {
        let page = query.page.max(1);
        let page_size = match query.page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };

        let accounts = AccountRepo::list(self.db.pool(), page, page_size)
            .await
            .map_err(ServiceError::persistence("list accounts"))?;
        Ok(AccountPage {
            total_count: accounts.len(),
            accounts,
            page,
            page_size,
        })
    }

    pub async fn update_account(
        &self,
        id: &str,
        request: &UpdateAccountRequest,
    ) -> Result<Account, ServiceError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidArgument("name is required".into()));
        }
        AccountRepo::update_name(self.db.pool(), id, name)
            .await
            .map_err(ServiceError::persistence("update account"))?;
        tracing::info!(account_id = %id, "account renamed");
        self.get_account(id).await
    }

    /// Transactions sent or received by an account, newest first
    pub async fn account_transactions(&self, id: &str) -> Result<Vec<TransactionRecord>, ServiceError> {
        self.get_account(id).await?;
        TransactionRepo::get_by_account(self.db.pool(), id)
            .await
            .map_err(ServiceError::persistence("list transactions"))
    }

    pub async fn close_account(&self, id: &str) -> Result<Account, ServiceError> {
        AccountRepo::update_status(self.db.pool(), id, AccountStatus::Closed)
            .await
            .map_err(ServiceError::persistence("close account"))?;
        tracing::info!(account_id = %id, "account closed");
        self.get_account(id).await
    }

    pub async fn delete_account(&self, id: &str) -> Result<(), ServiceError> {
        AccountRepo::soft_delete(self.db.pool(), id)
            .await
            .map_err(ServiceError::persistence("delete account"))?;
        tracing::info!(account_id = %id, "account deleted");
        Ok(())
    }
}
