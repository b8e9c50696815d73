//! Balance projection: the pure function from opening balance and entry
//! history to a cash box balance.
//!
//! The same arithmetic serves live postings (one step onto a known balance)
//! and reconciliation (a full replay of the history).

use crate::entry::{LedgerEntry, TransactionType};
use crate::money::Money;

/// Projects a single entry onto a known prior balance.
///
/// `None` means the result would leave the representable range.
pub fn project_next(balance: Money, kind: TransactionType, net_amount: Money) -> Option<Money> {
    balance.checked_add(kind.signed(net_amount))
}

/// Folds `(type, net amount)` pairs onto `opening`, in the given order.
pub fn project<I>(opening: Money, effects: I) -> Option<Money>
where
    I: IntoIterator<Item = (TransactionType, Money)>,
{
    effects
        .into_iter()
        .try_fold(opening, |balance, (kind, net)| project_next(balance, kind, net))
}

/// Orders entries by `(transaction_date, created_at, id)` ascending.
pub fn sort_entries(entries: &mut [LedgerEntry]) {
    entries.sort_by_key(|e| e.sort_key());
}

/// Replays a full history onto `opening`.
///
/// The input may be in any order; it is projected in the deterministic
/// history order.
pub fn project_history(opening: Money, entries: &[LedgerEntry]) -> Option<Money> {
    let mut ordered: Vec<&LedgerEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.sort_key());
    project(
        opening,
        ordered.into_iter().map(|e| (e.kind(), e.net_amount())),
    )
}
