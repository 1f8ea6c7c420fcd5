//! DBank Core - Domain types
//!
//! This crate contains the fundamental types shared by the transfer pipeline:
//! - `Amount`: strictly positive decimal for transfer amounts
//! - `Account`: balance-holding record of the relational store
//! - `TransactionRecord`: one row per transfer attempt
//! - `TransactionEvent`: wire payload published after a commit
//! - `CancelToken`: cooperative cancellation for background work

pub mod account;
pub mod amount;
pub mod cancel;
pub mod event;
pub mod transaction;

pub use account::{Account, AccountStatus};
pub use amount::{Amount, AmountError};
pub use cancel::CancelToken;
pub use event::TransactionEvent;
pub use transaction::{TransactionRecord, TransactionStatus, DEFAULT_TRANSACTION_TYPE};
