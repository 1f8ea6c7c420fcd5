//! DBank RPC - transaction orchestrator and HTTP surface
//!
//! Wires the transfer executor, event relay and ledger writer into one
//! [`AppContext`] and exposes it over HTTP.

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod http;
pub mod reconcile;
pub mod service;

pub use config::ServerConfig;
pub use context::AppContext;
pub use error::{ApiError, ServiceError};
pub use handlers::FailedTransactionHandler;
pub use reconcile::{ReconciliationReport, Reconciler};
pub use service::{
    AccountPage, AccountService, CreateAccountRequest, ListAccountsQuery, TransactionService,
    UpdateAccountRequest,
};
