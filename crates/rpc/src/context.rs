//! Application context - wires everything together

use crate::config::ServerConfig;
use crate::handlers::FailedTransactionHandler;
use crate::reconcile::Reconciler;
use crate::service::{AccountService, TransactionService};
use dbank_bus::{BusError, EventKind, EventPublisher, EventRelay, HandlerRegistry, MemoryBroker, RelayHandle};
use dbank_ledger::{LedgerEventHandler, LedgerWriter, SqliteLedgerStore};
use dbank_persistence::Database;
use dbank_transfer::TransferExecutor;
use std::sync::Arc;

/// Shared services handed to every request
#[derive(Clone)]
pub struct AppContext {
    pub db: Database,
    pub broker: MemoryBroker,
    pub ledger: LedgerWriter,
    pub transactions: TransactionService,
    pub accounts: AccountService,
    pub reconciler: Reconciler,
    relay: EventRelay,
}

impl AppContext {
    /// Connect the database, create the schema and build the pipeline
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let db = Database::connect(&config.db_url).await?;
        db.migrate().await?;
        Self::with_database(db, config).await
    }

    /// Build the pipeline on an already migrated database
    pub async fn with_database(db: Database, config: &ServerConfig) -> anyhow::Result<Self> {
        let broker = MemoryBroker::new();
        let store = open_ledger_store(&db, config).await?;
        let ledger = LedgerWriter::new(Arc::new(store)).with_policy(config.retry_policy());

        let registry = HandlerRegistry::new()
            .with(
                EventKind::TransactionSuccess,
                Arc::new(LedgerEventHandler::new(ledger.clone())),
            )
            .with(
                EventKind::TransactionFailure,
                Arc::new(FailedTransactionHandler),
            );
        let relay = EventRelay::new(broker.clone(), registry, config.relay_config()).await?;

        let publisher = EventPublisher::new(Arc::new(broker.clone()));
        let transactions = TransactionService::new(TransferExecutor::new(db.clone()), publisher);
        let accounts = AccountService::new(db.clone());
        let reconciler = Reconciler::new(accounts.clone(), transactions.clone(), ledger.clone());

        Ok(Self {
            db,
            broker,
            ledger,
            transactions,
            accounts,
            reconciler,
            relay,
        })
    }

    /// Start the consume loop that feeds the ledger
    pub async fn start_relay(&self) -> Result<RelayHandle, BusError> {
        self.relay.start().await
    }
}

/// Open the ledger store named by the config, or share the relational database
pub async fn open_ledger_store(db: &Database, config: &ServerConfig) -> anyhow::Result<SqliteLedgerStore> {
    let store = match &config.ledger_db_url {
        Some(url) => SqliteLedgerStore::connect(url).await?,
        None => {
            let store = SqliteLedgerStore::from_pool(db.pool().clone());
            store.migrate().await?;
            store
        }
    };
    Ok(store)
}
