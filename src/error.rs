//! Error types for the cash-box ledger.

use crate::money::Money;
use crate::store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operation.
///
/// Every variant except the outer-surface ones (`Io`, `Csv`, `MissingArgument`)
/// is raised before any mutation, or by a persistence write that left no
/// partial state behind.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No cash box exists with the given id
    #[error("Cash box {0} not found")]
    CashBoxNotFound(Uuid),

    /// No cash box matches the given code or name
    #[error("No cash box with code or name `{0}`")]
    UnknownCashBox(String),

    /// No ledger entry exists with the given id
    #[error("Ledger entry {0} not found")]
    EntryNotFound(Uuid),

    /// Posting amount must be strictly positive
    #[error("Invalid amount {0}: postings must be greater than zero")]
    InvalidAmount(Money),

    /// InstaPay commission outside `0..=amount`
    #[error("Invalid commission {commission} for amount {amount}")]
    InvalidCommission { amount: Money, commission: Money },

    /// A commission was supplied for a payment method that never carries one
    #[error("Commission is only allowed for InstaPay, got one for {method}")]
    UnexpectedCommission { method: String },

    /// Attempt to change `opening_balance`, `code`, `current_balance` or audit fields
    #[error("Field `{field}` of cash box {id} cannot be modified")]
    ImmutableFieldModified { id: Uuid, field: &'static str },

    /// A balance or total would leave the representable money range
    #[error("Balance of cash box {0} would overflow")]
    BalanceOverflow(Uuid),

    /// Policy forbids postings to inactive boxes
    #[error("Cash box {0} is inactive")]
    CashBoxInactive(Uuid),

    /// Cash box names must not be blank
    #[error("Cash box name must not be empty")]
    InvalidName,

    /// Report period outside the calendar
    #[error("Invalid period: month {month} of {year}")]
    InvalidPeriod { month: u32, year: i32 },

    /// The atomic write failed; nothing was persisted
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: cashbox-ledger <input.csv>")]
    MissingArgument,
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingCashBox(id) => LedgerError::CashBoxNotFound(id),
            other => LedgerError::PersistenceFailure(other.to_string()),
        }
    }
}

impl LedgerError {
    /// Returns `true` for errors the caller can fix by correcting its input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_)
                | LedgerError::BalanceOverflow(_)
                | LedgerError::InvalidCommission { .. }
                | LedgerError::UnexpectedCommission { .. }
                | LedgerError::ImmutableFieldModified { .. }
                | LedgerError::InvalidName
                | LedgerError::InvalidPeriod { .. }
        )
    }
}
