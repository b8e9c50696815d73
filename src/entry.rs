//! Ledger entry model: drafts submitted by callers and the immutable
//! entries the poster produces from them.

use crate::money::Money;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Direction of an entry's effect on the box balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money received into the box.
    Income,

    /// Money paid out of the box.
    Expense,
}

impl TransactionType {
    /// Applies the sign of this type to a net amount.
    pub fn signed(self, net_amount: Money) -> Money {
        match self {
            TransactionType::Income => net_amount,
            TransactionType::Expense => -net_amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => f.write_str("income"),
            TransactionType::Expense => f.write_str("expense"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Ok(TransactionType::Income),
            "expense" | "out" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type `{other}`")),
        }
    }
}

/// How the money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    CreditCard,
    /// Instant transfer; the only method that carries a commission.
    InstaPay,
    Other,
}

impl PaymentMethod {
    /// Whether entries with this method may carry a commission.
    pub fn carries_commission(self) -> bool {
        matches!(self, PaymentMethod::InstaPay)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::InstaPay => "instapay",
            PaymentMethod::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    /// Accepts snake_case, spaced or dashed spellings; `card` and `visa`
    /// are aliases for credit card.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();

        match key.as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "banktransfer" | "bank" | "transfer" => Ok(PaymentMethod::BankTransfer),
            "cheque" | "check" => Ok(PaymentMethod::Cheque),
            "creditcard" | "card" | "visa" => Ok(PaymentMethod::CreditCard),
            "instapay" => Ok(PaymentMethod::InstaPay),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("unknown payment method `{}`", s.trim())),
        }
    }
}

/// What a caller submits to the poster.
///
/// Financial fields are validated at post time; descriptive fields are
/// stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub kind: TransactionType,
    /// Gross amount; must be greater than zero.
    pub amount: Money,
    pub payment_method: PaymentMethod,
    /// Only meaningful for InstaPay.
    pub commission: Option<Money>,
    pub category: String,
    pub party_name: Option<String>,
    pub description: String,
    /// Assigned from the box's voucher sequence when absent.
    pub voucher_number: Option<String>,
    /// Business date of the event.
    pub transaction_date: NaiveDateTime,
    pub created_by: String,
}

impl EntryDraft {
    /// A cash draft with empty descriptive fields.
    pub fn new(
        kind: TransactionType,
        amount: Money,
        transaction_date: NaiveDateTime,
        created_by: impl Into<String>,
    ) -> Self {
        EntryDraft {
            kind,
            amount,
            payment_method: PaymentMethod::Cash,
            commission: None,
            category: String::new(),
            party_name: None,
            description: String::new(),
            voucher_number: None,
            transaction_date,
            created_by: created_by.into(),
        }
    }

    pub fn income(
        amount: Money,
        transaction_date: NaiveDateTime,
        created_by: impl Into<String>,
    ) -> Self {
        Self::new(TransactionType::Income, amount, transaction_date, created_by)
    }

    pub fn expense(
        amount: Money,
        transaction_date: NaiveDateTime,
        created_by: impl Into<String>,
    ) -> Self {
        Self::new(TransactionType::Expense, amount, transaction_date, created_by)
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission = Some(commission);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_party(mut self, party_name: impl Into<String>) -> Self {
        self.party_name = Some(party_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_voucher(mut self, voucher_number: impl Into<String>) -> Self {
        self.voucher_number = Some(voucher_number.into());
        self
    }
}

/// A posted ledger entry.
///
/// Entries are immutable: fields are only readable, and corrections are made
/// by posting an offsetting entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    id: Uuid,
    cash_box_id: Uuid,
    kind: TransactionType,
    amount: Money,
    net_amount: Money,
    payment_method: PaymentMethod,
    commission: Option<Money>,
    category: String,
    party_name: Option<String>,
    description: String,
    voucher_number: Option<String>,
    transaction_date: NaiveDateTime,
    balance_before: Money,
    balance_after: Money,
    created_at: DateTime<Utc>,
    created_by: String,
}

/// Values the poster computes for a draft under the box guard.
#[derive(Debug, Clone)]
pub(crate) struct Posting {
    pub id: Uuid,
    pub cash_box_id: Uuid,
    pub net_amount: Money,
    pub voucher_number: Option<String>,
    pub balance_before: Money,
    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub(crate) fn from_draft(draft: EntryDraft, posting: Posting) -> Self {
        LedgerEntry {
            id: posting.id,
            cash_box_id: posting.cash_box_id,
            kind: draft.kind,
            amount: draft.amount,
            net_amount: posting.net_amount,
            payment_method: draft.payment_method,
            commission: draft.commission,
            category: draft.category,
            party_name: draft.party_name,
            description: draft.description,
            voucher_number: posting.voucher_number,
            transaction_date: draft.transaction_date,
            balance_before: posting.balance_before,
            balance_after: posting.balance_after,
            created_at: posting.created_at,
            created_by: draft.created_by,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cash_box_id(&self) -> Uuid {
        self.cash_box_id
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    /// Gross amount as submitted.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Amount that reached the box, as resolved at post time.
    pub fn net_amount(&self) -> Money {
        self.net_amount
    }

    /// Signed change this entry makes to the box balance.
    pub fn net_effect(&self) -> Money {
        self.kind.signed(self.net_amount)
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn commission(&self) -> Option<Money> {
        self.commission
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn party_name(&self) -> Option<&str> {
        self.party_name.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn voucher_number(&self) -> Option<&str> {
        self.voucher_number.as_deref()
    }

    pub fn transaction_date(&self) -> NaiveDateTime {
        self.transaction_date
    }

    /// Cached box balance when this entry was posted.
    pub fn balance_before(&self) -> Money {
        self.balance_before
    }

    pub fn balance_after(&self) -> Money {
        self.balance_after
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Deterministic history order: business date, then creation time, then id.
    pub fn sort_key(&self) -> (NaiveDateTime, DateTime<Utc>, Uuid) {
        (self.transaction_date, self.created_at, self.id)
    }
}

/// Suggests the voucher number following `last`.
///
/// A purely numeric voucher is incremented; a dashed voucher such as
/// `VCH-20260101-0007` gets its trailing number incremented with the same
/// width. Anything else, including a number already at `u64::MAX`, yields
/// `None` and the entry keeps no voucher.
pub fn next_voucher_number(last: Option<&str>) -> Option<String> {
    let last = match last.map(str::trim) {
        None | Some("") => return Some("1".to_string()),
        Some(v) => v,
    };

    if let Ok(n) = last.parse::<u64>() {
        return n.checked_add(1).map(|next| next.to_string());
    }

    let (prefix, tail) = last.rsplit_once('-')?;
    let next = tail.parse::<u64>().ok()?.checked_add(1)?;
    Some(format!("{prefix}-{:0width$}", next, width = tail.len()))
}
