//! In-memory ledger store
//!
//! Same lookups as the SQLite store (by account, by transaction, by side and
//! account) over maps. Nothing survives the process; used in tests and for
//! throwaway pipelines.

use crate::entry::{EntryType, LedgerEntry};
use crate::store::{ensure_distinct_ids, LedgerStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collection {
    entries: HashMap<String, LedgerEntry>,
    by_account: HashMap<String, Vec<String>>,
    by_transaction: HashMap<String, Vec<String>>,
    by_type_account: HashMap<(EntryType, String), Vec<String>>,
}

impl Collection {
    fn insert(&mut self, entry: LedgerEntry) {
        let id = entry.id.clone();
        self.by_account
            .entry(entry.account_id.clone())
            .or_default()
            .push(id.clone());
        self.by_transaction
            .entry(entry.transaction_id.clone())
            .or_default()
            .push(id.clone());
        self.by_type_account
            .entry((entry.entry_type, entry.account_id.clone()))
            .or_default()
            .push(id.clone());
        self.entries.insert(id, entry);
    }

    fn lookup(&self, ids: Option<&Vec<String>>) -> Vec<LedgerEntry> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id))
            .cloned()
            .collect()
    }
}

/// Ledger store held in memory. Clones share the same collection.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    collection: Arc<RwLock<Collection>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries, deleted ones included
    pub async fn len(&self) -> usize {
        self.collection.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_entries(&self, entries: &[LedgerEntry]) -> Result<usize, StoreError> {
        ensure_distinct_ids(entries)?;

        let mut collection = self.collection.write().await;
        let mut inserted = 0;
        for entry in entries {
            if collection.entries.contains_key(&entry.id) {
                continue;
            }
            collection.insert(entry.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn entries_by_account(&self, account_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let collection = self.collection.read().await;
        Ok(newest_live(collection.lookup(collection.by_account.get(account_id))))
    }

    async fn entries_by_type(
        &self,
        entry_type: EntryType,
        account_id: &str,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let collection = self.collection.read().await;
        let key = (entry_type, account_id.to_string());
        Ok(newest_live(collection.lookup(collection.by_type_account.get(&key))))
    }

    async fn entries_by_transaction(&self, transaction_id: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let collection = self.collection.read().await;
        let mut entries = collection.lookup(collection.by_transaction.get(transaction_id));
        entries.sort_by_key(|e| e.entry_type);
        Ok(entries)
    }

    async fn account_balance(&self, account_id: &str) -> Result<Decimal, StoreError> {
        let collection = self.collection.read().await;
        Ok(collection
            .lookup(collection.by_account.get(account_id))
            .iter()
            .filter(|e| !e.is_deleted())
            .map(|e| e.balance)
            .sum())
    }

    async fn soft_delete(&self, entry_id: &str) -> Result<(), StoreError> {
        let mut collection = self.collection.write().await;
        let entry = collection
            .entries
            .get_mut(entry_id)
            .ok_or_else(|| StoreError::NotFound(entry_id.to_string()))?;
        if entry.deleted_at.is_none() {
            let now = Utc::now();
            entry.deleted_at = Some(now);
            entry.updated_at = now;
        }
        Ok(())
    }
}

fn newest_live(mut entries: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    entries.retain(|e| !e.is_deleted());
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    entries
}
