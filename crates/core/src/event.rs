//! TransactionEvent - the broker wire payload

use crate::transaction::{TransactionRecord, TransactionStatus};
use serde::{Deserialize, Serialize};

/// Transaction event published after a transfer commits.
///
/// Exists only on the broker and in consumer memory. The amount travels as a
/// decimal string so no precision is lost on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub transaction_id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub transaction_type: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
}

impl TransactionEvent {
    /// Build the event for a recorded transaction
    pub fn from_record(record: &TransactionRecord) -> Self {
        Self {
            transaction_id: record.id.clone(),
            from_account_id: record.from_account_id.clone(),
            to_account_id: record.to_account_id.clone(),
            transaction_type: record.transaction_type.clone(),
            amount: record.amount.to_string(),
            currency: record.currency.clone(),
            status: record.status.as_str().to_string(),
            description: record.description.clone(),
            timestamp: record.updated_at.timestamp(),
        }
    }

    /// Whether the event reports a successful transfer
    pub fn is_success(&self) -> bool {
        TransactionStatus::parse(&self.status) == Some(TransactionStatus::Success)
    }

    /// Encode as a JSON message body
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from a JSON message body
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
