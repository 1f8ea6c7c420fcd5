//! Relay handler writing successful transactions to the ledger

use crate::writer::LedgerWriter;
use async_trait::async_trait;
use dbank_bus::{EventHandler, HandlerError};
use dbank_core::{CancelToken, TransactionEvent};

/// Handles `transaction.success` by writing the entry pair
pub struct LedgerEventHandler {
    writer: LedgerWriter,
}

impl LedgerEventHandler {
    pub fn new(writer: LedgerWriter) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl EventHandler for LedgerEventHandler {
    fn name(&self) -> &str {
        "ledger-writer"
    }

    async fn handle(&self, event: &TransactionEvent, cancel: &CancelToken) -> Result<(), HandlerError> {
        if !event.is_success() {
            tracing::warn!(
                transaction_id = %event.transaction_id,
                status = %event.status,
                "non-success event skipped by ledger writer"
            );
            return Ok(());
        }

        match self.writer.write_event(event, cancel).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_permanent() => Err(HandlerError::permanent(e.to_string())),
            Err(e) => Err(HandlerError::transient(e.to_string())),
        }
    }
}
