//! Event publisher

use crate::broker::Broker;
use crate::error::BusError;
use crate::routing::{EventKind, TRANSACTIONS_EXCHANGE};
use dbank_core::TransactionEvent;
use std::sync::Arc;

/// Publishes transaction events to the topic exchange
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn Broker>,
}

impl EventPublisher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self { broker }
    }

    /// Publish under `transaction.success` or `transaction.failure`
    pub async fn publish(&self, event: &TransactionEvent) -> Result<EventKind, BusError> {
        let kind = EventKind::for_outcome(event.is_success());
        let body = event.to_json()?;
        self.broker
            .publish(TRANSACTIONS_EXCHANGE, kind.routing_key(), body)
            .await?;

        tracing::debug!(
            transaction_id = %event.transaction_id,
            routing_key = kind.routing_key(),
            "event published"
        );
        Ok(kind)
    }

    /// Publish, logging a failure instead of returning it
    pub async fn publish_best_effort(&self, event: &TransactionEvent) -> bool {
        match self.publish(event).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    transaction_id = %event.transaction_id,
                    error = %e,
                    "failed to publish transaction event"
                );
                false
            }
        }
    }
}
