//! SQLite ledger store: durability, idempotent inserts and indexed reads

use chrono::{Duration, Utc};
use dbank_core::TransactionEvent;
use dbank_ledger::{
    entries_for_event, EntryType, LedgerStore, SqliteLedgerStore, StoreError, LEDGER_INDEXES,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn url(temp_dir: &TempDir) -> String {
    format!("sqlite:{}?mode=rwc", temp_dir.path().join("ledger.db").display())
}

fn event(id: &str, from: &str, to: &str, amount: &str) -> TransactionEvent {
    TransactionEvent {
        transaction_id: id.into(),
        from_account_id: from.into(),
        to_account_id: to.into(),
        transaction_type: "transfer".into(),
        amount: amount.into(),
        currency: "USD".into(),
        status: "success".into(),
        description: "rent".into(),
        timestamp: 0,
    }
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let pair = entries_for_event(&event("tx-1", "A", "B", "40.00"), Utc::now()).unwrap();

    {
        let store = SqliteLedgerStore::connect(&url(&temp_dir)).await.unwrap();
        assert_eq!(store.insert_entries(&pair).await.unwrap(), 2);
    }

    let reopened = SqliteLedgerStore::connect(&url(&temp_dir)).await.unwrap();
    let entries = reopened.entries_by_transaction("tx-1").await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, pair[0].id);
    assert_eq!(entries[0].amount, dec!(40.00));
    assert_eq!(entries[1].id, pair[1].id);
    assert_eq!(entries[1].description, "rent");
    assert_eq!(reopened.account_balance("A").await.unwrap(), dec!(-40.00));
    assert_eq!(reopened.account_balance("B").await.unwrap(), dec!(40.00));

    // Redelivery after the restart still adds nothing
    assert_eq!(reopened.insert_entries(&pair).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_ids_in_one_batch_insert_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteLedgerStore::connect(&url(&temp_dir)).await.unwrap();
    let [debit, _] = entries_for_event(&event("tx-1", "A", "B", "1"), Utc::now()).unwrap();

    let err = store.insert_entries(&[debit.clone(), debit]).await.unwrap_err();
    assert!(!err.is_transient());
    assert!(store.entries_by_transaction("tx-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reads_by_account_and_side() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteLedgerStore::connect(&url(&temp_dir)).await.unwrap();
    let t0 = Utc::now();
    let first = entries_for_event(&event("tx-1", "A", "B", "40.00"), t0).unwrap();
    let second =
        entries_for_event(&event("tx-2", "B", "A", "15.50"), t0 + Duration::seconds(1)).unwrap();
    store.insert_entries(&first).await.unwrap();
    store.insert_entries(&second).await.unwrap();

    let a = store.entries_by_account("A").await.unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].transaction_id, "tx-2");
    assert_eq!(a[1].transaction_id, "tx-1");

    let credits = store.entries_by_type(EntryType::Credit, "A").await.unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].id, "tx-2:credit");
    assert_eq!(credits[0].balance, dec!(15.50));

    let debits = store.entries_by_type(EntryType::Debit, "A").await.unwrap();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].balance, dec!(-40.00));

    assert_eq!(store.account_balance("A").await.unwrap(), dec!(-24.50));
    assert_eq!(store.account_balance("nobody").await.unwrap(), Decimal::ZERO);
}

#[tokio::test]
async fn test_soft_delete_hides_entry_but_keeps_row() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteLedgerStore::connect(&url(&temp_dir)).await.unwrap();
    let pair = entries_for_event(&event("tx-1", "A", "B", "40"), Utc::now()).unwrap();
    store.insert_entries(&pair).await.unwrap();

    store.soft_delete("tx-1:debit").await.unwrap();
    // Deleting twice is a no-op
    store.soft_delete("tx-1:debit").await.unwrap();

    assert!(store.entries_by_account("A").await.unwrap().is_empty());
    assert!(store.entries_by_type(EntryType::Debit, "A").await.unwrap().is_empty());
    assert_eq!(store.account_balance("A").await.unwrap(), Decimal::ZERO);

    let by_tx = store.entries_by_transaction("tx-1").await.unwrap();
    assert_eq!(by_tx.len(), 2);
    assert_eq!(by_tx[0].entry_type, EntryType::Debit);
    assert!(by_tx[0].is_deleted());

    assert!(matches!(
        store.soft_delete("missing").await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_migrate_creates_indexes() {
    let temp_dir = TempDir::new().unwrap();
    let url = url(&temp_dir);
    SqliteLedgerStore::connect(&url).await.unwrap();

    let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
    let names: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'ledgers'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (name, _) in LEDGER_INDEXES {
        assert!(names.iter().any(|n| n == name), "missing index {name}");
    }
}
