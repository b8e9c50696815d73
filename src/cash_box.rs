//! Cash box model.
//!
//! Maintains the invariant: `current_balance == opening_balance + Σ net effects`
//! over the box's entries. Only the transaction poster moves `current_balance`.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named container holding a running balance.
///
/// # Mutability
///
/// `name`, `notes` and `is_active` may change through the registry's update
/// path. `id`, `code`, `opening_balance` and the creation audit fields never
/// change after creation, and `current_balance` changes only by posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBox {
    pub id: Uuid,

    /// Human-readable unique code such as `CB001`.
    pub code: String,

    pub name: String,

    pub notes: Option<String>,

    /// Balance at creation. Never mutated afterwards.
    pub opening_balance: Money,

    /// Cached projection of the entry history. May be negative.
    pub current_balance: Money,

    /// Inactive boxes keep their history readable but refuse new postings
    /// unless policy allows them.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub created_by: String,

    pub updated_at: Option<DateTime<Utc>>,

    pub updated_by: Option<String>,
}

impl CashBox {
    /// Returns `true` if postings are accepted under the default policy.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Names the first field that differs from `stored` but must not change
    /// through an update.
    pub(crate) fn immutable_change(&self, stored: &CashBox) -> Option<&'static str> {
        if self.code != stored.code {
            Some("code")
        } else if self.opening_balance != stored.opening_balance {
            Some("opening_balance")
        } else if self.current_balance != stored.current_balance {
            Some("current_balance")
        } else if self.created_at != stored.created_at {
            Some("created_at")
        } else if self.created_by != stored.created_by {
            Some("created_by")
        } else {
            None
        }
    }
}

/// Input for creating a cash box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashBoxDefinition {
    pub name: String,
    pub notes: Option<String>,
    pub opening_balance: Money,
    pub is_active: bool,
    pub created_by: String,
}

impl CashBoxDefinition {
    /// An active box definition with no notes.
    pub fn new(
        name: impl Into<String>,
        opening_balance: Money,
        created_by: impl Into<String>,
    ) -> Self {
        CashBoxDefinition {
            name: name.into(),
            notes: None,
            opening_balance,
            is_active: true,
            created_by: created_by.into(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
