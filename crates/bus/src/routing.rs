//! Exchange, routing keys and topic matching

use std::fmt;

/// Topic exchange carrying transaction events
pub const TRANSACTIONS_EXCHANGE: &str = "transactions";

/// Queue consumed by the relay
pub const CONSUMER_QUEUE: &str = "dbank.transactions.consumer";

/// Queue receiving messages that will never be processed
pub const DEAD_LETTER_QUEUE: &str = "dbank.transactions.dead-letter";

/// Binding pattern matching every routing key
pub const ALL_EVENTS: &str = "#";

/// The closed set of event kinds the relay dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TransactionSuccess,
    TransactionFailure,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::TransactionSuccess, EventKind::TransactionFailure];

    pub fn routing_key(&self) -> &'static str {
        match self {
            EventKind::TransactionSuccess => "transaction.success",
            EventKind::TransactionFailure => "transaction.failure",
        }
    }

    pub fn from_routing_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.routing_key() == key)
    }

    /// Kind for a transfer outcome
    pub fn for_outcome(success: bool) -> Self {
        if success {
            EventKind::TransactionSuccess
        } else {
            EventKind::TransactionFailure
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.routing_key())
    }
}

/// Match a routing key against a topic pattern.
///
/// Words are separated by `.`; `*` matches exactly one word and `#` matches
/// zero or more words.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = routing_key.split('.').collect();
    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((&word, rest)) => match key.split_first() {
            Some((&head, tail)) => (word == "*" || word == head) && matches_words(rest, tail),
            None => false,
        },
    }
}
