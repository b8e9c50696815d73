//! # Cash-Box Ledger
//!
//! The core of a cash-box accounting system: cash boxes with running
//! balances, commission-aware income/expense postings, and reconciliation
//! of cached balances against the full entry history.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: 2 decimal places via `rust_decimal`
//! - **Append-only history**: entries are never edited; corrections are offsetting entries
//! - **Strict invariant**: `current_balance == opening_balance + Σ net effects`
//! - **Per-box linearization**: postings to one box are serialized, different boxes run in parallel
//!
//! ## Example
//!
//! ```
//! use cashbox_ledger::{CashBoxDefinition, CashBoxLedger, EntryDraft, Money, PaymentMethod};
//! use chrono::NaiveDate;
//! use std::str::FromStr;
//!
//! let ledger = CashBoxLedger::default();
//! let main = ledger
//!     .create_cash_box(CashBoxDefinition::new("Main", Money::from_str("500").unwrap(), "admin"))
//!     .unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! ledger
//!     .post_transaction(
//!         main.id,
//!         EntryDraft::income(Money::from_str("200").unwrap(), date, "clerk")
//!             .with_method(PaymentMethod::InstaPay)
//!             .with_commission(Money::from_str("6").unwrap()),
//!     )
//!     .unwrap();
//!
//! assert_eq!(ledger.current_balance(main.id).unwrap().to_string(), "694.00");
//! assert!(ledger.reconcile(main.id).unwrap().matches_cached);
//! ```

pub mod cash_box;
pub mod commission;
pub mod config;
pub mod entry;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod money;
pub mod poster;
pub mod projector;
pub mod registry;
pub mod report;
pub mod store;

pub use cash_box::{CashBox, CashBoxDefinition};
pub use commission::{resolve_net_amount, suggest_instapay_commission};
pub use config::LedgerConfig;
pub use entry::{EntryDraft, LedgerEntry, PaymentMethod, TransactionType};
pub use error::{LedgerError, Result};
pub use ledger::{CashBoxLedger, DateRange, ImportSummary, Reconciliation};
pub use money::Money;
pub use registry::CashBoxRegistry;
pub use report::{CategorySummary, MonthlyReport, YearlyReport};
pub use store::{InMemoryStore, LedgerStore};
