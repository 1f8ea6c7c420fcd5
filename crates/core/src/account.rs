//! Account - the balance-holding record owned by the relational store

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "closed" => Some(AccountStatus::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer account.
///
/// The balance is only mutated inside a transfer's atomic unit and is never
/// negative after a committed transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub currency: String,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new active account with an opening balance
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        currency: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            name: String::new(),
            currency: currency.into(),
            balance,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Set a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the account may take part in a transfer
    pub fn is_transferable(&self) -> bool {
        self.status == AccountStatus::Active && self.deleted_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parse() {
        assert_eq!(AccountStatus::parse("ACTIVE"), Some(AccountStatus::Active));
        assert_eq!(AccountStatus::parse("closed"), Some(AccountStatus::Closed));
        assert_eq!(AccountStatus::parse("frozen"), None);
    }

    #[test]
    fn test_transferable() {
        let mut account = Account::new("acc-1", "user-1", "USD", dec!(10));
        assert!(account.is_transferable());

        account.status = AccountStatus::Closed;
        assert!(!account.is_transferable());

        account.status = AccountStatus::Active;
        account.deleted_at = Some(Utc::now());
        assert!(!account.is_transferable());
    }
}
