//! Integration tests for the relational transfer unit

use dbank_core::{Account, AccountStatus, TransactionStatus};
use dbank_persistence::{
    apply_transfer, AccountRepo, Database, NewTransfer, PersistenceError, TransactionRepo,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

async fn setup(temp_dir: &TempDir) -> Database {
    let url = format!("sqlite:{}?mode=rwc", temp_dir.path().join("dbank.db").display());
    let db = Database::connect(&url).await.unwrap();
    db.migrate().await.unwrap();
    db
}

async fn seed(db: &Database, id: &str, balance: Decimal) {
    let account = Account::new(id, format!("owner-{id}"), "USD", balance);
    AccountRepo::insert(db.pool(), &account).await.unwrap();
}

fn transfer(from: &str, to: &str, amount: Decimal) -> NewTransfer {
    NewTransfer {
        transaction_id: uuid::Uuid::new_v4().to_string(),
        from_account_id: from.to_string(),
        to_account_id: to.to_string(),
        transaction_type: "transfer".to_string(),
        amount,
        currency: "USD".to_string(),
        description: "rent".to_string(),
    }
}

#[tokio::test]
async fn test_transfer_applies_exact_balances() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(100.00)).await;
    seed(&db, "B", dec!(10.00)).await;

    let record = apply_transfer(db.pool(), &transfer("A", "B", dec!(40.00)))
        .await
        .unwrap();
    assert_eq!(record.status, TransactionStatus::Success);

    let a = AccountRepo::get_by_id(db.pool(), "A").await.unwrap();
    let b = AccountRepo::get_by_id(db.pool(), "B").await.unwrap();
    assert_eq!(a.balance, dec!(60.00));
    assert_eq!(b.balance, dec!(50.00));

    let stored = TransactionRepo::get_by_id(db.pool(), &record.id).await.unwrap();
    assert_eq!(stored.id, record.id);
    assert_eq!(stored.amount, dec!(40.00));
    assert_eq!(stored.status, TransactionStatus::Success);
    assert_eq!(stored.description, "rent");
}

#[tokio::test]
async fn test_repeated_small_transfers_do_not_drift() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(1.00)).await;
    seed(&db, "B", dec!(0)).await;

    for _ in 0..10 {
        apply_transfer(db.pool(), &transfer("A", "B", dec!(0.10)))
            .await
            .unwrap();
    }

    let a = AccountRepo::get_by_id(db.pool(), "A").await.unwrap();
    let b = AccountRepo::get_by_id(db.pool(), "B").await.unwrap();
    assert_eq!(a.balance, Decimal::ZERO);
    assert_eq!(b.balance, dec!(1.00));
}

#[tokio::test]
async fn test_insufficient_funds_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(10.00)).await;
    seed(&db, "B", dec!(10.00)).await;

    let plan = transfer("A", "B", dec!(40.00));
    let err = apply_transfer(db.pool(), &plan).await.unwrap_err();
    assert!(matches!(err, PersistenceError::InsufficientFunds { .. }));

    assert_eq!(AccountRepo::get_by_id(db.pool(), "A").await.unwrap().balance, dec!(10.00));
    assert_eq!(AccountRepo::get_by_id(db.pool(), "B").await.unwrap().balance, dec!(10.00));
    assert!(TransactionRepo::get_by_id(db.pool(), &plan.transaction_id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_failed_record_insert_leaves_balances_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(100)).await;
    seed(&db, "B", dec!(0)).await;

    let first = transfer("A", "B", dec!(10));
    apply_transfer(db.pool(), &first).await.unwrap();

    // Same transaction id again: the record insert fails after both balance
    // updates ran inside the unit.
    let err = apply_transfer(db.pool(), &first).await.unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyExists { .. }));

    assert_eq!(AccountRepo::get_by_id(db.pool(), "A").await.unwrap().balance, dec!(90));
    assert_eq!(AccountRepo::get_by_id(db.pool(), "B").await.unwrap().balance, dec!(10));
}

#[tokio::test]
async fn test_closed_or_deleted_accounts_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(100)).await;
    seed(&db, "B", dec!(0)).await;
    seed(&db, "C", dec!(0)).await;

    AccountRepo::update_status(db.pool(), "B", AccountStatus::Closed)
        .await
        .unwrap();
    let err = apply_transfer(db.pool(), &transfer("A", "B", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::AccountUnavailable(id) if id == "B"));

    AccountRepo::soft_delete(db.pool(), "C").await.unwrap();
    let err = apply_transfer(db.pool(), &transfer("A", "C", dec!(1)))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(AccountRepo::get_by_id(db.pool(), "A").await.unwrap().balance, dec!(100));
}

#[tokio::test]
async fn test_concurrent_drain_never_overdraws() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(100)).await;
    seed(&db, "B", dec!(0)).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            apply_transfer(db.pool(), &transfer("A", "B", dec!(20))).await
        }));
    }

    let mut committed = 0u32;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            committed += 1;
        }
    }

    let a = AccountRepo::get_by_id(db.pool(), "A").await.unwrap();
    let b = AccountRepo::get_by_id(db.pool(), "B").await.unwrap();
    assert_eq!(committed, 5);
    assert_eq!(a.balance, Decimal::ZERO);
    assert_eq!(b.balance, dec!(100));

    let history = TransactionRepo::get_by_account(db.pool(), "A").await.unwrap();
    assert_eq!(history.len() as u32, committed);
}

#[tokio::test]
async fn test_concurrent_funded_transfers_all_commit() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(1000)).await;
    seed(&db, "B", dec!(0)).await;
    seed(&db, "C", dec!(1000)).await;

    // Two senders crediting the same receiver at once
    let mut handles = Vec::new();
    for i in 0..20 {
        let db = db.clone();
        let from = if i % 2 == 0 { "A" } else { "C" };
        handles.push(tokio::spawn(async move {
            apply_transfer(db.pool(), &transfer(from, "B", dec!(1))).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok(), "funded transfer failed: {:?}", result.err());
    }

    let a = AccountRepo::get_by_id(db.pool(), "A").await.unwrap();
    let b = AccountRepo::get_by_id(db.pool(), "B").await.unwrap();
    let c = AccountRepo::get_by_id(db.pool(), "C").await.unwrap();
    assert_eq!(a.balance, dec!(990));
    assert_eq!(c.balance, dec!(990));
    assert_eq!(b.balance, dec!(20));
    assert_eq!(TransactionRepo::get_by_account(db.pool(), "B").await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_duplicate_account_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    seed(&db, "A", dec!(1)).await;

    let err = AccountRepo::insert(db.pool(), &Account::new("A", "x", "USD", dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyExists { .. }));
}

#[tokio::test]
async fn test_account_paging_rename_and_status_listing() {
    let temp_dir = TempDir::new().unwrap();
    let db = setup(&temp_dir).await;
    for id in ["A", "B", "C"] {
        seed(&db, id, dec!(10)).await;
    }
    AccountRepo::soft_delete(db.pool(), "B").await.unwrap();

    let first = AccountRepo::list(db.pool(), 1, 1).await.unwrap();
    let second = AccountRepo::list(db.pool(), 2, 1).await.unwrap();
    assert_eq!(first[0].id, "A");
    assert_eq!(second[0].id, "C");
    assert!(AccountRepo::list(db.pool(), 3, 1).await.unwrap().is_empty());

    AccountRepo::update_name(db.pool(), "C", "Savings").await.unwrap();
    assert_eq!(AccountRepo::get_by_id(db.pool(), "C").await.unwrap().name, "Savings");
    assert!(AccountRepo::update_name(db.pool(), "B", "x")
        .await
        .unwrap_err()
        .is_not_found());

    let plan = transfer("A", "C", dec!(1));
    apply_transfer(db.pool(), &plan).await.unwrap();
    let success = TransactionRepo::get_by_status(db.pool(), TransactionStatus::Success)
        .await
        .unwrap();
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].id, plan.transaction_id);
    assert!(TransactionRepo::get_by_status(db.pool(), TransactionStatus::Failed)
        .await
        .unwrap()
        .is_empty());
}
