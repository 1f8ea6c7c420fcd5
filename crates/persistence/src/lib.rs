//! # DBank Persistence
//!
//! Relational store for accounts and transaction records (SQLite via sqlx).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dbank_persistence::{Database, AccountRepo};
//!
//! let db = Database::connect("sqlite:dbank.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let account = AccountRepo::get_by_id(db.pool(), "acc-1").await?;
//! ```

pub mod error;
pub mod repos;
pub mod schema;
pub mod transfer;

pub use error::{PersistenceError, PersistenceResult};
pub use repos::{AccountRepo, TransactionRepo};
pub use schema::{init_schema, AccountRow, TransactionRow};
pub use transfer::{apply_transfer, NewTransfer};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Database facade - owns the connection pool shared by all request tasks
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the given SQLite URL (e.g. "sqlite:dbank.db?mode=rwc")
    pub async fn connect(db_url: &str) -> PersistenceResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create tables and indexes
    pub async fn migrate(&self) -> PersistenceResult<()> {
        init_schema(&self.pool).await
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
