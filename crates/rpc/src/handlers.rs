//! Relay handlers owned by the server

use async_trait::async_trait;
use dbank_bus::{EventHandler, HandlerError};
use dbank_core::{CancelToken, TransactionEvent};

/// Reports failed transfers to operators
pub struct FailedTransactionHandler;

#[async_trait]
impl EventHandler for FailedTransactionHandler {
    fn name(&self) -> &str {
        "failed-transaction"
    }

    async fn handle(&self, event: &TransactionEvent, _cancel: &CancelToken) -> Result<(), HandlerError> {
        tracing::error!(
            transaction_id = %event.transaction_id,
            from_account_id = %event.from_account_id,
            to_account_id = %event.to_account_id,
            amount = %event.amount,
            currency = %event.currency,
            "transfer failed"
        );
        Ok(())
    }
}
