//! Broker abstraction and the in-process topic broker
//!
//! `Broker` is the publishing side and `QueueBroker` the consuming side; a
//! networked broker implements both. `MemoryBroker` keeps the AMQP semantics
//! the relay depends on: topic exchanges, queue bindings with wildcards,
//! explicit ack/nack, delivery counters and dead-letter queues. Its queues
//! live in process memory, so ready and unacknowledged messages do not
//! survive a restart. Unacknowledged deliveries go back to their queue when
//! dropped.

use crate::error::BusError;
use crate::routing::topic_matches;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Publishing side of a message broker
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish a message body to an exchange under a routing key
    async fn publish(&self, exchange: &str, routing_key: &str, body: Vec<u8>) -> Result<(), BusError>;
}

/// Consuming side of a message broker: topology declaration and queue pulls
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Declare a topic exchange (idempotent)
    async fn declare_exchange(&self, name: &str) -> Result<(), BusError>;

    /// Declare a queue (idempotent)
    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), BusError>;

    /// Bind a queue to an exchange with a topic pattern
    async fn bind(&self, queue: &str, exchange: &str, pattern: &str) -> Result<(), BusError>;

    /// Start consuming a queue
    async fn consume(&self, queue: &str) -> Result<Box<dyn MessageStream>, BusError>;
}

/// Deliveries pulled from one queue
#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Wait for the next delivery
    async fn next(&self) -> Delivery;
}

/// How a delivery is settled with the broker it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Requeue,
    Reject,
}

/// Broker-side handle that settles one delivery
pub trait Acknowledger: Send + Sync {
    fn settle(self: Box<Self>, settlement: Settlement);
}

/// Queue declaration options
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Queue receiving messages rejected without requeue
    pub dead_letter: Option<String>,
}

impl QueueOptions {
    pub fn with_dead_letter(queue: impl Into<String>) -> Self {
        Self {
            dead_letter: Some(queue.into()),
        }
    }
}

#[derive(Debug, Clone)]
struct Message {
    routing_key: String,
    body: Vec<u8>,
    delivery_count: u32,
}

struct Queue {
    name: String,
    messages: Mutex<VecDeque<Message>>,
    notify: Notify,
    dead_letter: Option<Arc<Queue>>,
}

impl Queue {
    fn new(name: &str, dead_letter: Option<Arc<Queue>>) -> Self {
        Self {
            name: name.to_string(),
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            dead_letter,
        }
    }

    fn push_back(&self, message: Message) {
        lock(&self.messages).push_back(message);
        self.notify.notify_one();
    }

    fn push_front(&self, message: Message) {
        lock(&self.messages).push_front(message);
        self.notify.notify_one();
    }

    fn pop(&self) -> Option<Message> {
        lock(&self.messages).pop_front()
    }

    fn len(&self) -> usize {
        lock(&self.messages).len()
    }
}

struct Binding {
    exchange: String,
    pattern: String,
    queue: Arc<Queue>,
}

#[derive(Default)]
struct State {
    exchanges: HashSet<String>,
    queues: HashMap<String, Arc<Queue>>,
    bindings: Vec<Binding>,
    closed: bool,
}

/// In-process topic broker. Clones share the same exchanges and queues.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<State>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a topic exchange (idempotent)
    pub fn declare_exchange(&self, name: &str) {
        lock(&self.state).exchanges.insert(name.to_string());
    }

    /// Declare a queue (idempotent). The dead-letter queue must already exist.
    pub fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), BusError> {
        let mut state = lock(&self.state);
        if state.queues.contains_key(name) {
            return Ok(());
        }
        let dead_letter = match options.dead_letter {
            Some(dlq) => Some(
                state
                    .queues
                    .get(&dlq)
                    .cloned()
                    .ok_or(BusError::UnknownQueue(dlq))?,
            ),
            None => None,
        };
        state
            .queues
            .insert(name.to_string(), Arc::new(Queue::new(name, dead_letter)));
        Ok(())
    }

    /// Bind a queue to an exchange with a topic pattern
    pub fn bind(&self, queue: &str, exchange: &str, pattern: &str) -> Result<(), BusError> {
        let mut state = lock(&self.state);
        if !state.exchanges.contains(exchange) {
            return Err(BusError::UnknownExchange(exchange.to_string()));
        }
        let queue = state
            .queues
            .get(queue)
            .cloned()
            .ok_or_else(|| BusError::UnknownQueue(queue.to_string()))?;
        let exists = state
            .bindings
            .iter()
            .any(|b| b.exchange == exchange && b.pattern == pattern && b.queue.name == queue.name);
        if !exists {
            state.bindings.push(Binding {
                exchange: exchange.to_string(),
                pattern: pattern.to_string(),
                queue,
            });
        }
        Ok(())
    }

    /// Start consuming a queue
    pub fn consume(&self, queue: &str) -> Result<Consumer, BusError> {
        let state = lock(&self.state);
        let queue = state
            .queues
            .get(queue)
            .cloned()
            .ok_or_else(|| BusError::UnknownQueue(queue.to_string()))?;
        Ok(Consumer { queue })
    }

    /// Number of ready messages in a queue
    pub fn queue_depth(&self, queue: &str) -> Result<usize, BusError> {
        let state = lock(&self.state);
        state
            .queues
            .get(queue)
            .map(|q| q.len())
            .ok_or_else(|| BusError::UnknownQueue(queue.to_string()))
    }

    /// Refuse further publishes, as a dropped connection would
    pub fn close(&self) {
        lock(&self.state).closed = true;
    }

    fn route(&self, exchange: &str, routing_key: &str) -> Result<Vec<Arc<Queue>>, BusError> {
        let state = lock(&self.state);
        if state.closed {
            return Err(BusError::Closed);
        }
        if !state.exchanges.contains(exchange) {
            return Err(BusError::UnknownExchange(exchange.to_string()));
        }

        let mut targets: Vec<Arc<Queue>> = Vec::new();
        for binding in &state.bindings {
            if binding.exchange == exchange
                && topic_matches(&binding.pattern, routing_key)
                && !targets.iter().any(|q| q.name == binding.queue.name)
            {
                targets.push(binding.queue.clone());
            }
        }
        Ok(targets)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, exchange: &str, routing_key: &str, body: Vec<u8>) -> Result<(), BusError> {
        let targets = self.route(exchange, routing_key)?;
        if targets.is_empty() {
            tracing::debug!(exchange, routing_key, "message unroutable, dropped");
        }
        for queue in targets {
            queue.push_back(Message {
                routing_key: routing_key.to_string(),
                body: body.clone(),
                delivery_count: 0,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl QueueBroker for MemoryBroker {
    async fn declare_exchange(&self, name: &str) -> Result<(), BusError> {
        MemoryBroker::declare_exchange(self, name);
        Ok(())
    }

    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), BusError> {
        MemoryBroker::declare_queue(self, name, options)
    }

    async fn bind(&self, queue: &str, exchange: &str, pattern: &str) -> Result<(), BusError> {
        MemoryBroker::bind(self, queue, exchange, pattern)
    }

    async fn consume(&self, queue: &str) -> Result<Box<dyn MessageStream>, BusError> {
        Ok(Box::new(MemoryBroker::consume(self, queue)?))
    }
}

/// Pull handle on a single queue
pub struct Consumer {
    queue: Arc<Queue>,
}

impl Consumer {
    /// Wait for the next message
    pub async fn next(&self) -> Delivery {
        loop {
            if let Some(delivery) = self.try_next() {
                return delivery;
            }
            self.queue.notify.notified().await;
        }
    }

    /// Take the next message if one is ready
    pub fn try_next(&self) -> Option<Delivery> {
        self.queue.pop().map(|mut message| {
            message.delivery_count += 1;
            Delivery::new(
                message.routing_key.clone(),
                message.body.clone(),
                message.delivery_count,
                Box::new(QueueAcker {
                    queue: self.queue.clone(),
                    message,
                }),
            )
        })
    }
}

#[async_trait]
impl MessageStream for Consumer {
    async fn next(&self) -> Delivery {
        Consumer::next(self).await
    }
}

struct QueueAcker {
    queue: Arc<Queue>,
    message: Message,
}

impl Acknowledger for QueueAcker {
    fn settle(self: Box<Self>, settlement: Settlement) {
        let QueueAcker { queue, message } = *self;
        match settlement {
            Settlement::Ack => {}
            Settlement::Requeue => queue.push_front(message),
            Settlement::Reject => match &queue.dead_letter {
                Some(dlq) => dlq.push_back(message),
                None => tracing::error!(
                    queue = %queue.name,
                    routing_key = %message.routing_key,
                    "message rejected with no dead-letter queue, discarded"
                ),
            },
        }
    }
}

/// A message handed to a consumer and not yet settled.
///
/// Dropping it without `ack` or `nack` returns the message to its queue.
pub struct Delivery {
    routing_key: String,
    body: Vec<u8>,
    delivery_count: u32,
    acker: Option<Box<dyn Acknowledger>>,
}

impl Delivery {
    pub fn new(
        routing_key: String,
        body: Vec<u8>,
        delivery_count: u32,
        acker: Box<dyn Acknowledger>,
    ) -> Self {
        Self {
            routing_key,
            body,
            delivery_count,
            acker: Some(acker),
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// How many times this message has been delivered, this time included
    pub fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    /// Acknowledge: the message is removed for good
    pub fn ack(mut self) {
        self.settle(Settlement::Ack);
    }

    /// Reject: requeue, or move to the dead-letter queue
    pub fn nack(mut self, requeue: bool) {
        self.settle(if requeue {
            Settlement::Requeue
        } else {
            Settlement::Reject
        });
    }

    fn settle(&mut self, settlement: Settlement) {
        if let Some(acker) = self.acker.take() {
            acker.settle(settlement);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        self.settle(Settlement::Requeue);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
