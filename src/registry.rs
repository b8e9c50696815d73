//! Cash box registry: creation with code generation, metadata updates and
//! read accessors. Owns the per-box guards shared with the poster.

use crate::cash_box::{CashBox, CashBoxDefinition};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::guard::BoxGuards;
use crate::money::Money;
use crate::store::{CashBoxMetadata, LedgerStore};
use chrono::Utc;
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// CRUD over cash box definitions.
pub struct CashBoxRegistry {
    store: Arc<dyn LedgerStore>,
    guards: Arc<BoxGuards>,
    config: LedgerConfig,
    /// Serializes creations so count-derived codes stay unique.
    creating: Mutex<()>,
}

impl CashBoxRegistry {
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        CashBoxRegistry {
            store,
            guards: Arc::new(BoxGuards::new()),
            config,
            creating: Mutex::new(()),
        }
    }

    /// Guards shared with the transaction poster.
    pub fn guards(&self) -> Arc<BoxGuards> {
        Arc::clone(&self.guards)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Creates and persists a new box with `current_balance = opening_balance`.
    pub fn create(&self, definition: CashBoxDefinition) -> Result<CashBox> {
        let name = definition.name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidName);
        }

        let _creating = self.creating.lock().unwrap_or_else(PoisonError::into_inner);

        let cash_box = CashBox {
            id: self.store.next_id(),
            code: self.next_code(),
            name: name.to_string(),
            notes: definition.notes,
            opening_balance: definition.opening_balance,
            current_balance: definition.opening_balance,
            is_active: definition.is_active,
            created_at: Utc::now(),
            created_by: definition.created_by,
            updated_at: None,
            updated_by: None,
        };

        self.store.insert_cash_box(&cash_box)?;
        debug!(
            "Created cash box {} ({}) with opening balance {}",
            cash_box.code, cash_box.name, cash_box.opening_balance
        );
        Ok(cash_box)
    }

    /// Sequential code from the current box count, or a timestamp code when
    /// the count is unavailable.
    fn next_code(&self) -> String {
        match self.store.count_cash_boxes() {
            Ok(count) => format_sequential_code(&self.config.code_prefix, count + 1),
            Err(e) => {
                warn!("Falling back to timestamp cash box code: {}", e);
                format!(
                    "{}{}",
                    self.config.code_prefix,
                    Utc::now().format("%Y%m%d%H%M%S")
                )
            }
        }
    }

    /// Writes `name`, `notes` and `is_active` from `edited`.
    ///
    /// Any difference in an immutable field is rejected before writing.
    pub fn update(&self, edited: &CashBox) -> Result<()> {
        if edited.name.trim().is_empty() {
            return Err(LedgerError::InvalidName);
        }

        self.get_by_id(edited.id)?;

        // Linearize with postings so an activation toggle never lands mid-post.
        self.guards.with_guard(edited.id, || -> Result<()> {
            let stored = self.get_by_id(edited.id)?;
            if let Some(field) = edited.immutable_change(&stored) {
                return Err(LedgerError::ImmutableFieldModified {
                    id: edited.id,
                    field,
                });
            }

            let metadata = CashBoxMetadata {
                name: edited.name.trim().to_string(),
                notes: edited.notes.clone(),
                is_active: edited.is_active,
                updated_at: Utc::now(),
                updated_by: edited.updated_by.clone(),
            };
            self.store.save_cash_box_metadata(edited.id, &metadata)?;
            debug!(
                "Updated cash box {} (active: {})",
                stored.code, metadata.is_active
            );
            Ok(())
        })
    }

    /// Toggles the activation state.
    pub fn set_active(&self, id: Uuid, is_active: bool, updated_by: &str) -> Result<CashBox> {
        let mut edited = self.get_by_id(id)?;
        edited.is_active = is_active;
        edited.updated_by = Some(updated_by.to_string());
        self.update(&edited)?;
        self.get_by_id(id)
    }

    pub fn get_by_id(&self, id: Uuid) -> Result<CashBox> {
        self.store
            .load_cash_box(id)?
            .ok_or(LedgerError::CashBoxNotFound(id))
    }

    /// All boxes ordered by name, then code.
    pub fn get_all(&self) -> Result<Vec<CashBox>> {
        let mut boxes = self.store.list_cash_boxes()?;
        boxes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        Ok(boxes)
    }

    pub fn get_active(&self) -> Result<Vec<CashBox>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(CashBox::is_active)
            .collect())
    }

    /// Looks a box up by exact code, or by case-insensitive name.
    pub fn find(&self, key: &str) -> Result<Option<CashBox>> {
        let key = key.trim();
        let boxes = self.get_all()?;
        if let Some(found) = boxes.iter().find(|b| b.code == key) {
            return Ok(Some(found.clone()));
        }
        Ok(boxes
            .into_iter()
            .find(|b| b.name.eq_ignore_ascii_case(key)))
    }

    pub fn current_balance(&self, id: Uuid) -> Result<Money> {
        Ok(self.get_by_id(id)?.current_balance)
    }
}

/// `CB` + counter zero-padded to three digits (wider counters are kept whole).
pub fn format_sequential_code(prefix: &str, counter: usize) -> String {
    format!("{prefix}{counter:03}")
}
