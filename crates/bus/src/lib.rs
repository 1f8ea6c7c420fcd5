//! DBank Event Relay - publishes transaction events and dispatches them to handlers
//!
//! # Features
//! - In-process topic broker with ack/nack, redelivery and dead-lettering
//! - Best-effort publisher used after a transfer commits
//! - `EventKind` to `EventHandler` registry resolved at relay construction
//! - Cancellable consume loop

pub mod broker;
pub mod error;
pub mod handler;
pub mod publisher;
pub mod registry;
pub mod relay;
pub mod routing;

pub use broker::{
    Acknowledger, Broker, Consumer, Delivery, MemoryBroker, MessageStream, QueueBroker, QueueOptions,
    Settlement,
};
pub use error::{BusError, HandlerError};
pub use handler::EventHandler;
pub use publisher::EventPublisher;
pub use registry::HandlerRegistry;
pub use relay::{declare_topology, Disposition, EventRelay, RelayConfig, RelayHandle};
pub use routing::{
    topic_matches, EventKind, ALL_EVENTS, CONSUMER_QUEUE, DEAD_LETTER_QUEUE, TRANSACTIONS_EXCHANGE,
};
