//! Event handler trait

use crate::error::HandlerError;
use async_trait::async_trait;
use dbank_core::{CancelToken, TransactionEvent};

/// Handles one kind of transaction event.
///
/// Handlers must tolerate redelivery of the same event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name (for logging)
    fn name(&self) -> &str;

    /// Process an event. `cancel` fires when the relay is stopping.
    async fn handle(&self, event: &TransactionEvent, cancel: &CancelToken) -> Result<(), HandlerError>;
}
