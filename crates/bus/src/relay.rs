//! Event relay - consume loop and dispatch
//!
//! One task pulls deliveries serially from the consumer queue and hands each
//! to the handler registered for its routing key.

use crate::broker::{Delivery, QueueBroker, QueueOptions};
use crate::error::BusError;
use crate::registry::HandlerRegistry;
use crate::routing::{EventKind, ALL_EVENTS, CONSUMER_QUEUE, DEAD_LETTER_QUEUE, TRANSACTIONS_EXCHANGE};
use dbank_core::{CancelToken, TransactionEvent};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Relay topology and redelivery limit
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub exchange: String,
    pub queue: String,
    pub dead_letter_queue: String,
    pub binding: String,
    /// Deliveries after which a failing message is dead-lettered
    pub max_deliveries: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            exchange: TRANSACTIONS_EXCHANGE.to_string(),
            queue: CONSUMER_QUEUE.to_string(),
            dead_letter_queue: DEAD_LETTER_QUEUE.to_string(),
            binding: ALL_EVENTS.to_string(),
            max_deliveries: 5,
        }
    }
}

/// What happened to a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handled and acknowledged
    Acked,
    /// Acknowledged without a handler (unknown routing key or no handler)
    Dropped,
    /// Returned to the queue for another attempt
    Requeued,
    /// Moved to the dead-letter queue
    DeadLettered,
}

/// Consumes transaction events and dispatches them to handlers
#[derive(Clone)]
pub struct EventRelay {
    broker: Arc<dyn QueueBroker>,
    registry: Arc<HandlerRegistry>,
    config: RelayConfig,
}

impl EventRelay {
    /// Declare the exchange, queues and binding, then build the relay
    pub async fn new(
        broker: impl QueueBroker + 'static,
        registry: HandlerRegistry,
        config: RelayConfig,
    ) -> Result<Self, BusError> {
        declare_topology(&broker, &config).await?;
        Ok(Self {
            broker: Arc::new(broker),
            registry: Arc::new(registry),
            config,
        })
    }

    /// Spawn the consume loop
    pub async fn start(&self) -> Result<RelayHandle, BusError> {
        let consumer = self.broker.consume(&self.config.queue).await?;
        let cancel = CancelToken::new();
        let relay = self.clone();
        let loop_cancel = cancel.clone();

        tracing::info!(
            queue = %self.config.queue,
            handlers = self.registry.len(),
            "event relay started"
        );

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    delivery = consumer.next() => {
                        relay.dispatch(delivery, &loop_cancel).await;
                    }
                }
            }
            tracing::info!(queue = %relay.config.queue, "event relay stopped");
        });

        Ok(RelayHandle { cancel, task })
    }

    /// Route one delivery to its handler and settle it
    pub async fn dispatch(&self, delivery: Delivery, cancel: &CancelToken) -> Disposition {
        let routing_key = delivery.routing_key().to_string();

        let Some(kind) = EventKind::from_routing_key(&routing_key) else {
            tracing::warn!(routing_key = %routing_key, "unknown routing key, dropping message");
            delivery.ack();
            return Disposition::Dropped;
        };
        let Some(handler) = self.registry.get(kind) else {
            tracing::warn!(routing_key = %routing_key, "no handler registered, dropping message");
            delivery.ack();
            return Disposition::Dropped;
        };

        let event = match TransactionEvent::from_json(delivery.body()) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(
                    routing_key = %routing_key,
                    error = %e,
                    "undecodable message, dead-lettering"
                );
                delivery.nack(false);
                return Disposition::DeadLettered;
            }
        };

        match handler.handle(&event, cancel).await {
            Ok(()) => {
                tracing::debug!(
                    handler = handler.name(),
                    transaction_id = %event.transaction_id,
                    "event handled"
                );
                delivery.ack();
                Disposition::Acked
            }
            Err(e) if e.is_permanent() || delivery.delivery_count() >= self.config.max_deliveries => {
                tracing::error!(
                    handler = handler.name(),
                    transaction_id = %event.transaction_id,
                    deliveries = delivery.delivery_count(),
                    error = %e,
                    "event will not be processed, dead-lettering"
                );
                delivery.nack(false);
                Disposition::DeadLettered
            }
            Err(e) => {
                tracing::warn!(
                    handler = handler.name(),
                    transaction_id = %event.transaction_id,
                    deliveries = delivery.delivery_count(),
                    error = %e,
                    "event handler failed, requeueing"
                );
                delivery.nack(true);
                Disposition::Requeued
            }
        }
    }
}

/// Declare the exchange, the dead-letter queue and the bound consumer queue
pub async fn declare_topology(broker: &dyn QueueBroker, config: &RelayConfig) -> Result<(), BusError> {
    broker.declare_exchange(&config.exchange).await?;
    broker
        .declare_queue(&config.dead_letter_queue, QueueOptions::default())
        .await?;
    broker
        .declare_queue(
            &config.queue,
            QueueOptions::with_dead_letter(&config.dead_letter_queue),
        )
        .await?;
    broker
        .bind(&config.queue, &config.exchange, &config.binding)
        .await
}

/// Running consume loop
pub struct RelayHandle {
    cancel: CancelToken,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Stop pulling and wait for the loop to exit. Queued messages stay queued.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "event relay task failed");
        }
    }
}
