//! Ledger entries - double-entry pair built from a transaction event

use crate::error::{LedgerError, LedgerResult};
use chrono::{DateTime, Utc};
use dbank_core::TransactionEvent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Side of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "debit",
            EntryType::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debit" => Some(EntryType::Debit),
            "credit" => Some(EntryType::Credit),
            _ => None,
        }
    }

    /// Sign applied to the amount to get the balance contribution
    pub fn sign(&self) -> Decimal {
        match self {
            EntryType::Debit => Decimal::NEGATIVE_ONE,
            EntryType::Credit => Decimal::ONE,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deterministic entry id, so a redelivered event maps to the same entries
pub fn entry_id(transaction_id: &str, entry_type: EntryType) -> String {
    format!("{}:{}", transaction_id, entry_type.as_str())
}

/// One side of a transfer in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub account_id: String,
    pub transaction_id: String,
    pub entry_type: EntryType,
    /// Unsigned transfer amount
    pub amount: Decimal,
    /// Signed contribution to the account balance
    pub balance: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Build the debit (sender) and credit (receiver) entries for an event.
///
/// Both entries share the creation timestamp `at`, and their contributions
/// sum to zero.
pub fn entries_for_event(event: &TransactionEvent, at: DateTime<Utc>) -> LedgerResult<[LedgerEntry; 2]> {
    if event.transaction_id.trim().is_empty() {
        return Err(LedgerError::MissingField("transaction_id"));
    }
    if event.from_account_id.trim().is_empty() {
        return Err(LedgerError::MissingField("from_account_id"));
    }
    if event.to_account_id.trim().is_empty() {
        return Err(LedgerError::MissingField("to_account_id"));
    }

    let amount = Decimal::from_str(event.amount.trim())
        .map_err(|_| LedgerError::InvalidAmount(event.amount.clone()))?;
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(event.amount.clone()));
    }

    let build = |entry_type: EntryType, account_id: &str| LedgerEntry {
        id: entry_id(&event.transaction_id, entry_type),
        account_id: account_id.to_string(),
        transaction_id: event.transaction_id.clone(),
        entry_type,
        amount,
        balance: amount * entry_type.sign(),
        currency: event.currency.clone(),
        description: event.description.clone(),
        created_at: at,
        updated_at: at,
        deleted_at: None,
    };

    Ok([
        build(EntryType::Debit, &event.from_account_id),
        build(EntryType::Credit, &event.to_account_id),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(amount: &str) -> TransactionEvent {
        TransactionEvent {
            transaction_id: "tx-1".into(),
            from_account_id: "A".into(),
            to_account_id: "B".into(),
            transaction_type: "transfer".into(),
            amount: amount.into(),
            currency: "USD".into(),
            status: "success".into(),
            description: "rent".into(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_entry_pair_sums_to_zero() {
        let at = Utc::now();
        let [debit, credit] = entries_for_event(&event("40.00"), at).unwrap();

        assert_eq!(debit.id, "tx-1:debit");
        assert_eq!(debit.account_id, "A");
        assert_eq!(debit.balance, dec!(-40.00));
        assert_eq!(credit.id, "tx-1:credit");
        assert_eq!(credit.account_id, "B");
        assert_eq!(credit.balance, dec!(40.00));
        assert_eq!(debit.amount, credit.amount);
        assert_eq!(debit.balance + credit.balance, Decimal::ZERO);
        assert_eq!(debit.created_at, credit.created_at);
        assert_eq!(credit.description, "rent");
    }

    #[test]
    fn test_entry_type_parse() {
        assert_eq!(EntryType::parse("debit"), Some(EntryType::Debit));
        assert_eq!(EntryType::parse(EntryType::Credit.as_str()), Some(EntryType::Credit));
        assert_eq!(EntryType::parse("Debit"), None);
    }

    #[test]
    fn test_malformed_amount_is_permanent() {
        for amount in ["forty", "", "-1", "0"] {
            let err = entries_for_event(&event(amount), Utc::now()).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)), "{amount}");
            assert!(err.is_permanent());
        }
    }

    #[test]
    fn test_missing_transaction_id() {
        let mut e = event("1");
        e.transaction_id = String::new();
        assert!(matches!(
            entries_for_event(&e, Utc::now()),
            Err(LedgerError::MissingField("transaction_id"))
        ));
    }

    #[test]
    fn test_entry_serializes_lowercase_type() {
        let [debit, _] = entries_for_event(&event("1.5"), Utc::now()).unwrap();
        let json = serde_json::to_value(&debit).unwrap();
        assert_eq!(json["entry_type"], "debit");
        assert_eq!(json["balance"], "-1.5");
        assert!(json.get("deleted_at").is_none());
    }
}
