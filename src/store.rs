//! Persistence collaborator.
//!
//! The ledger only needs a handful of operations from its storage engine:
//! box rows, an append-only entry table, and one atomic write that inserts
//! an entry together with its box's new balance.

use crate::cash_box::CashBox;
use crate::entry::LedgerEntry;
use crate::money::Money;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("cash box {0} does not exist")]
    MissingCashBox(Uuid),

    #[error("record {0} already exists")]
    Duplicate(Uuid),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Mutable cash box fields written by the registry's update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashBoxMetadata {
    pub name: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Storage engine contract.
///
/// Implementations must give read-after-write consistency and make
/// [`commit_posting`](LedgerStore::commit_posting) all-or-nothing.
pub trait LedgerStore: Send + Sync {
    /// Fresh unique id for a new record.
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    fn insert_cash_box(&self, cash_box: &CashBox) -> StoreResult<()>;

    fn load_cash_box(&self, id: Uuid) -> StoreResult<Option<CashBox>>;

    fn list_cash_boxes(&self) -> StoreResult<Vec<CashBox>>;

    fn count_cash_boxes(&self) -> StoreResult<usize>;

    fn save_cash_box_metadata(&self, id: Uuid, metadata: &CashBoxMetadata) -> StoreResult<()>;

    /// Inserts `entry` and sets its box's `current_balance` to `new_balance`
    /// as one unit. On error neither write is visible.
    fn commit_posting(&self, entry: &LedgerEntry, new_balance: Money) -> StoreResult<()>;

    /// All entries of a box, in no particular order.
    fn entries_for(&self, cash_box_id: Uuid) -> StoreResult<Vec<LedgerEntry>>;

    fn load_entry(&self, id: Uuid) -> StoreResult<Option<LedgerEntry>>;

    /// Voucher of the most recently created entry of a box that has one.
    fn last_voucher_number(&self, cash_box_id: Uuid) -> StoreResult<Option<String>> {
        let mut entries = self.entries_for(cash_box_id)?;
        entries.sort_by_key(|e| (e.created_at(), e.id()));
        Ok(entries
            .iter()
            .rev()
            .find_map(|e| e.voucher_number().map(str::to_string)))
    }
}

#[derive(Debug, Default)]
struct Tables {
    cash_boxes: HashMap<Uuid, CashBox>,
    entries: HashMap<Uuid, LedgerEntry>,
    entries_by_box: HashMap<Uuid, Vec<Uuid>>,
}

/// In-process store backed by a single `RwLock`.
///
/// Suitable for single-instance deployments and tests. Every write happens
/// under the write lock, so `commit_posting` is atomic with respect to all
/// readers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryStore {
    fn insert_cash_box(&self, cash_box: &CashBox) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables.cash_boxes.contains_key(&cash_box.id) {
            return Err(StoreError::Duplicate(cash_box.id));
        }
        tables.cash_boxes.insert(cash_box.id, cash_box.clone());
        tables.entries_by_box.entry(cash_box.id).or_default();
        Ok(())
    }

    fn load_cash_box(&self, id: Uuid) -> StoreResult<Option<CashBox>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.cash_boxes.get(&id).cloned())
    }

    fn list_cash_boxes(&self) -> StoreResult<Vec<CashBox>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.cash_boxes.values().cloned().collect())
    }

    fn count_cash_boxes(&self) -> StoreResult<usize> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.cash_boxes.len())
    }

    fn save_cash_box_metadata(&self, id: Uuid, metadata: &CashBoxMetadata) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let cash_box = tables
            .cash_boxes
            .get_mut(&id)
            .ok_or(StoreError::MissingCashBox(id))?;

        cash_box.name = metadata.name.clone();
        cash_box.notes = metadata.notes.clone();
        cash_box.is_active = metadata.is_active;
        cash_box.updated_at = Some(metadata.updated_at);
        cash_box.updated_by = metadata.updated_by.clone();
        Ok(())
    }

    fn commit_posting(&self, entry: &LedgerEntry, new_balance: Money) -> StoreResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);

        // Check everything before touching anything.
        if !tables.cash_boxes.contains_key(&entry.cash_box_id()) {
            return Err(StoreError::MissingCashBox(entry.cash_box_id()));
        }
        if tables.entries.contains_key(&entry.id()) {
            return Err(StoreError::Duplicate(entry.id()));
        }

        if let Some(cash_box) = tables.cash_boxes.get_mut(&entry.cash_box_id()) {
            cash_box.current_balance = new_balance;
        }
        tables
            .entries_by_box
            .entry(entry.cash_box_id())
            .or_default()
            .push(entry.id());
        tables.entries.insert(entry.id(), entry.clone());
        Ok(())
    }

    fn entries_for(&self, cash_box_id: Uuid) -> StoreResult<Vec<LedgerEntry>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let ids = match tables.entries_by_box.get(&cash_box_id) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        Ok(ids
            .iter()
            .filter_map(|id| tables.entries.get(id))
            .cloned()
            .collect())
    }

    fn load_entry(&self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.entries.get(&id).cloned())
    }

    /// Walks the box's entries in insertion order, newest first.
    fn last_voucher_number(&self, cash_box_id: Uuid) -> StoreResult<Option<String>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let ids = match tables.entries_by_box.get(&cash_box_id) {
            Some(ids) => ids,
            None => return Ok(None),
        };
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| tables.entries.get(id))
            .find_map(|e| e.voucher_number().map(str::to_string)))
    }
}
