//! Transfer request and its stateless validation

use crate::error::TransferError;
use dbank_core::{Amount, DEFAULT_TRANSACTION_TYPE};
use serde::Deserialize;

/// A transfer as submitted by a caller. The amount is still a string here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferRequest {
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub description: String,
}

/// A request that passed every check not needing the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTransfer {
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: Amount,
    pub currency: String,
    pub transaction_type: String,
    pub description: String,
}

impl TransferRequest {
    /// Check required fields, amount format and positivity, and self-transfer
    pub fn validate(&self) -> Result<ValidTransfer, TransferError> {
        let from = self.from_account_id.trim();
        let to = self.to_account_id.trim();
        let currency = self.currency.trim();

        if from.is_empty() {
            return Err(TransferError::MissingField("from_account_id"));
        }
        if to.is_empty() {
            return Err(TransferError::MissingField("to_account_id"));
        }
        let amount: Amount = self.amount.parse()?;
        if currency.is_empty() {
            return Err(TransferError::MissingField("currency"));
        }
        if from == to {
            return Err(TransferError::SameAccount);
        }

        let transaction_type = match self.transaction_type.trim() {
            "" => DEFAULT_TRANSACTION_TYPE.to_string(),
            other => other.to_string(),
        };

        Ok(ValidTransfer {
            from_account_id: from.to_string(),
            to_account_id: to.to_string(),
            amount,
            currency: currency.to_uppercase(),
            transaction_type,
            description: self.description.clone(),
        })
    }
}
