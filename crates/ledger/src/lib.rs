//! DBank Ledger - double-entry materialization of transaction events
//!
//! Every successful transfer becomes one debit entry for the sender and one
//! credit entry for the receiver, inserted together. Entry ids derive from
//! the transaction id, so redelivered events never duplicate entries.
//!
//! [`SqliteLedgerStore`] keeps entries durably in a `ledgers` table;
//! [`MemoryLedgerStore`] keeps them in process memory.

pub mod entry;
pub mod error;
pub mod handler;
pub mod memory;
pub mod retry;
pub mod sqlite;
pub mod store;
pub mod writer;

pub use entry::{entries_for_event, entry_id, EntryType, LedgerEntry};
pub use error::{LedgerError, LedgerResult};
pub use handler::LedgerEventHandler;
pub use memory::MemoryLedgerStore;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sqlite::{SqliteLedgerStore, LEDGER_INDEXES, LEDGER_TABLE};
pub use store::{LedgerStore, StoreError};
pub use writer::LedgerWriter;
