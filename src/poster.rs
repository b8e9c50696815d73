//! Transaction poster: validates drafts and appends entries to cash boxes.
//!
//! The critical section for one box is load, resolve, project, persist. It
//! runs under that box's guard so concurrent posts are linearized, and the
//! entry and the new balance are committed as one unit.

use crate::cash_box::CashBox;
use crate::commission::resolve_net_amount;
use crate::config::LedgerConfig;
use crate::entry::{
    next_voucher_number, EntryDraft, LedgerEntry, PaymentMethod, Posting, TransactionType,
};
use crate::error::{LedgerError, Result};
use crate::guard::BoxGuards;
use crate::projector::project_next;
use crate::store::LedgerStore;
use chrono::{NaiveDateTime, Utc};
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Appends ledger entries and keeps each box's cached balance in step.
pub struct TransactionPoster {
    store: Arc<dyn LedgerStore>,
    guards: Arc<BoxGuards>,
    allow_inactive_postings: bool,
}

impl TransactionPoster {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        guards: Arc<BoxGuards>,
        config: &LedgerConfig,
    ) -> Self {
        TransactionPoster {
            store,
            guards,
            allow_inactive_postings: config.allow_inactive_postings,
        }
    }

    /// Posts `draft` against box `cash_box_id` and returns the persisted entry.
    ///
    /// On any error nothing has been written.
    pub fn post(&self, cash_box_id: Uuid, draft: EntryDraft) -> Result<LedgerEntry> {
        if !draft.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(draft.amount));
        }
        let net_amount = resolve_net_amount(draft.amount, draft.payment_method, draft.commission)?;

        // Unknown ids never get a guard.
        self.load(cash_box_id)?;

        self.guards.with_guard(cash_box_id, || -> Result<LedgerEntry> {
            let cash_box = self.load(cash_box_id)?;

            if !cash_box.is_active && !self.allow_inactive_postings {
                return Err(LedgerError::CashBoxInactive(cash_box_id));
            }

            let voucher_number = match draft.voucher_number.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Some(v.to_string()),
                _ => {
                    let last = self.last_voucher_number(cash_box_id)?;
                    next_voucher_number(last.as_deref())
                }
            };

            let balance_before = cash_box.current_balance;
            let balance_after = project_next(balance_before, draft.kind, net_amount)
                .ok_or(LedgerError::BalanceOverflow(cash_box_id))?;
            let entry = LedgerEntry::from_draft(
                draft,
                Posting {
                    id: self.store.next_id(),
                    cash_box_id,
                    net_amount,
                    voucher_number,
                    balance_before,
                    balance_after,
                    created_at: Utc::now(),
                },
            );

            self.store.commit_posting(&entry, balance_after)?;
            debug!(
                "Posted {} {} (net {}) to {}: {} -> {}",
                entry.kind(),
                entry.amount(),
                net_amount,
                cash_box.code,
                balance_before,
                balance_after
            );
            Ok(entry)
        })
    }

    /// Appends an entry that cancels the net effect of `entry_id`.
    ///
    /// The offset has the opposite type and the original's net amount, in
    /// cash, so it never carries a commission of its own.
    pub fn reverse(
        &self,
        entry_id: Uuid,
        transaction_date: NaiveDateTime,
        created_by: &str,
    ) -> Result<LedgerEntry> {
        let original = self
            .store
            .load_entry(entry_id)?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;

        let kind = match original.kind() {
            TransactionType::Income => TransactionType::Expense,
            TransactionType::Expense => TransactionType::Income,
        };
        let reference = original
            .voucher_number()
            .map(str::to_string)
            .unwrap_or_else(|| original.id().to_string());

        let mut draft = EntryDraft::new(kind, original.net_amount(), transaction_date, created_by)
            .with_method(PaymentMethod::Cash)
            .with_category(original.category())
            .with_description(format!("Reversal of {reference}"));
        if let Some(party) = original.party_name() {
            draft = draft.with_party(party);
        }

        self.post(original.cash_box_id(), draft)
    }

    fn load(&self, cash_box_id: Uuid) -> Result<CashBox> {
        self.store
            .load_cash_box(cash_box_id)?
            .ok_or(LedgerError::CashBoxNotFound(cash_box_id))
    }

    /// Voucher of the most recently created entry that has one.
    pub fn last_voucher_number(&self, cash_box_id: Uuid) -> Result<Option<String>> {
        Ok(self.store.last_voucher_number(cash_box_id)?)
    }
}
