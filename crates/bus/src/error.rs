//! Event relay errors

use thiserror::Error;

/// Errors that can occur in the broker or publisher
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Exchange '{0}' is not declared")]
    UnknownExchange(String),

    #[error("Queue '{0}' is not declared")]
    UnknownQueue(String),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Broker connection closed")]
    Closed,
}

/// Failure reported by an event handler.
///
/// A transient failure is redelivered; a permanent one goes to the
/// dead-letter queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

impl HandlerError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent(reason.into())
    }

    pub fn is_permanent(&self) -> bool {
        matches!(self, HandlerError::Permanent(_))
    }
}
