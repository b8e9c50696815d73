//! The ledger facade callers talk to.
//!
//! Wires the registry, the poster and the store together and exposes the
//! cash box operations, history queries, reconciliation, reports and the
//! CSV batch surface.

use crate::cash_box::{CashBox, CashBoxDefinition};
use crate::config::LedgerConfig;
use crate::entry::{EntryDraft, LedgerEntry, PaymentMethod, TransactionType};
use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::poster::TransactionPoster;
use crate::projector::{project_history, sort_entries};
use crate::registry::CashBoxRegistry;
use crate::report::{self, MonthlyReport, YearlyReport};
use crate::store::{InMemoryStore, LedgerStore};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Inclusive bounds on `transaction_date`; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDateTime) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Outcome of replaying a box's history against its cached balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub cash_box_id: Uuid,
    pub computed_balance: Money,
    pub cached_balance: Money,
    pub matches_cached: bool,
    pub entry_count: usize,
}

/// Counters reported by [`CashBoxLedger::import_csv`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub opened: usize,
    pub posted: usize,
    pub rejected: usize,
}

/// Cash box ledger core.
///
/// Safe to share across threads (`Arc<CashBoxLedger>`): postings against one
/// box are linearized, postings against different boxes run in parallel.
pub struct CashBoxLedger {
    store: Arc<dyn LedgerStore>,
    registry: CashBoxRegistry,
    poster: TransactionPoster,
}

impl CashBoxLedger {
    /// A ledger over a fresh in-memory store.
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        let registry = CashBoxRegistry::new(Arc::clone(&store), config.clone());
        let poster = TransactionPoster::new(Arc::clone(&store), registry.guards(), &config);
        CashBoxLedger {
            store,
            registry,
            poster,
        }
    }

    pub fn registry(&self) -> &CashBoxRegistry {
        &self.registry
    }

    pub fn create_cash_box(&self, definition: CashBoxDefinition) -> Result<CashBox> {
        self.registry.create(definition)
    }

    pub fn update_cash_box(&self, cash_box: &CashBox) -> Result<()> {
        self.registry.update(cash_box)
    }

    pub fn set_cash_box_active(
        &self,
        id: Uuid,
        is_active: bool,
        updated_by: &str,
    ) -> Result<CashBox> {
        self.registry.set_active(id, is_active, updated_by)
    }

    pub fn get_cash_box(&self, id: Uuid) -> Result<CashBox> {
        self.registry.get_by_id(id)
    }

    pub fn get_all_cash_boxes(&self) -> Result<Vec<CashBox>> {
        self.registry.get_all()
    }

    pub fn get_active_cash_boxes(&self) -> Result<Vec<CashBox>> {
        self.registry.get_active()
    }

    pub fn current_balance(&self, id: Uuid) -> Result<Money> {
        self.registry.current_balance(id)
    }

    pub fn post_transaction(&self, cash_box_id: Uuid, draft: EntryDraft) -> Result<LedgerEntry> {
        self.poster.post(cash_box_id, draft)
    }

    /// Posts the offsetting entry for `entry_id`.
    pub fn reverse_transaction(
        &self,
        entry_id: Uuid,
        transaction_date: NaiveDateTime,
        created_by: &str,
    ) -> Result<LedgerEntry> {
        self.poster.reverse(entry_id, transaction_date, created_by)
    }

    pub fn get_transaction(&self, entry_id: Uuid) -> Result<LedgerEntry> {
        self.store
            .load_entry(entry_id)?
            .ok_or(LedgerError::EntryNotFound(entry_id))
    }

    /// Entries of a box within `range`, in history order.
    pub fn get_transactions(
        &self,
        cash_box_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<LedgerEntry>> {
        self.registry.get_by_id(cash_box_id)?;
        let range = range.unwrap_or_default();
        let mut entries: Vec<LedgerEntry> = self
            .store
            .entries_for(cash_box_id)?
            .into_iter()
            .filter(|e| range.contains(e.transaction_date()))
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    pub fn get_transactions_by_month(
        &self,
        cash_box_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<Vec<LedgerEntry>> {
        Ok(self.monthly_report(cash_box_id, month, year)?.entries)
    }

    pub fn last_voucher_number(&self, cash_box_id: Uuid) -> Result<Option<String>> {
        self.registry.get_by_id(cash_box_id)?;
        self.poster.last_voucher_number(cash_box_id)
    }

    /// Replays the full history and compares it with the cached balance.
    ///
    /// Runs under the box guard so the snapshot never straddles a posting.
    pub fn reconcile(&self, cash_box_id: Uuid) -> Result<Reconciliation> {
        self.registry.get_by_id(cash_box_id)?;

        let guards = self.registry.guards();
        guards.with_guard(cash_box_id, || -> Result<Reconciliation> {
            let cash_box = self.registry.get_by_id(cash_box_id)?;
            let entries = self.store.entries_for(cash_box_id)?;
            let computed_balance = project_history(cash_box.opening_balance, &entries)
                .ok_or(LedgerError::BalanceOverflow(cash_box_id))?;
            let matches_cached = computed_balance == cash_box.current_balance;

            if !matches_cached {
                warn!(
                    "Cash box {} out of balance: cached {}, history {}",
                    cash_box.code, cash_box.current_balance, computed_balance
                );
            }

            Ok(Reconciliation {
                cash_box_id,
                computed_balance,
                cached_balance: cash_box.current_balance,
                matches_cached,
                entry_count: entries.len(),
            })
        })
    }

    pub fn monthly_report(
        &self,
        cash_box_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<MonthlyReport> {
        let cash_box = self.registry.get_by_id(cash_box_id)?;
        let entries = self.store.entries_for(cash_box_id)?;
        report::monthly_report(
            cash_box_id,
            cash_box.opening_balance,
            &entries,
            month,
            year,
        )
    }

    pub fn yearly_report(&self, cash_box_id: Uuid, year: i32) -> Result<YearlyReport> {
        let cash_box = self.registry.get_by_id(cash_box_id)?;
        let entries = self.store.entries_for(cash_box_id)?;
        report::yearly_report(cash_box_id, cash_box.opening_balance, &entries, year)
    }

    /// Imports cash boxes and postings from CSV in streaming fashion.
    ///
    /// Rows that fail to parse or are rejected by the ledger are logged at
    /// warn level and skipped.
    pub fn import_csv<R: Read>(&self, reader: R, created_by: &str) -> Result<ImportSummary> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut summary = ImportSummary::default();

        for (row_idx, result) in csv_reader.deserialize::<ImportRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                    summary.rejected += 1;
                    continue;
                }
            };

            let op = match record.parse(created_by) {
                Ok(op) => op,
                Err(message) => {
                    warn!("Row {}: Invalid record: {}", row_num, message);
                    summary.rejected += 1;
                    continue;
                }
            };

            let opens = matches!(op, ImportOp::Open(_));
            match self.apply(op) {
                Ok(()) if opens => summary.opened += 1,
                Ok(()) => summary.posted += 1,
                Err(e) => {
                    warn!("Row {}: {}", row_num, e);
                    summary.rejected += 1;
                }
            }
        }

        debug!(
            "Import finished: {} opened, {} posted, {} rejected",
            summary.opened, summary.posted, summary.rejected
        );
        Ok(summary)
    }

    fn apply(&self, op: ImportOp) -> Result<()> {
        match op {
            ImportOp::Open(definition) => {
                self.create_cash_box(definition)?;
            }
            ImportOp::Post { box_key, draft } => {
                let cash_box = self
                    .registry
                    .find(&box_key)?
                    .ok_or(LedgerError::UnknownCashBox(box_key))?;
                self.post_transaction(cash_box.id, draft)?;
            }
        }
        Ok(())
    }

    /// Writes one CSV row per cash box, sorted by code.
    pub fn write_summary<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "code",
            "name",
            "opening",
            "current",
            "active",
            "entries",
            "reconciled",
        ])?;

        let mut boxes = self.get_all_cash_boxes()?;
        boxes.sort_by(|a, b| a.code.cmp(&b.code));

        for cash_box in boxes {
            let reconciliation = self.reconcile(cash_box.id)?;
            csv_writer.write_record([
                cash_box.code,
                cash_box.name,
                cash_box.opening_balance.to_string(),
                reconciliation.cached_balance.to_string(),
                cash_box.is_active.to_string(),
                reconciliation.entry_count.to_string(),
                reconciliation.matches_cached.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl Default for CashBoxLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

/// Raw import row.
///
/// `kind` is `open`, `income` or `expense`. For `open`, `box` is the new
/// box's name and `amount` its opening balance; otherwise `box` names the
/// target box by code or name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImportRecord {
    kind: String,
    #[serde(rename = "box")]
    cash_box: String,
    amount: Option<String>,
    method: Option<String>,
    commission: Option<String>,
    date: Option<String>,
    category: Option<String>,
    party: Option<String>,
    description: Option<String>,
    voucher: Option<String>,
    notes: Option<String>,
}

#[derive(Debug)]
enum ImportOp {
    Open(CashBoxDefinition),
    Post { box_key: String, draft: EntryDraft },
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ImportRecord {
    fn parse(&self, created_by: &str) -> std::result::Result<ImportOp, String> {
        let amount = match non_empty(&self.amount) {
            Some(raw) => Money::from_str(raw).map_err(|e| e.to_string())?,
            None if self.kind.trim().eq_ignore_ascii_case("open") => Money::ZERO,
            None => return Err("missing amount".to_string()),
        };

        if self.kind.trim().eq_ignore_ascii_case("open") {
            let mut definition = CashBoxDefinition::new(self.cash_box.trim(), amount, created_by);
            definition.notes = non_empty(&self.notes).map(str::to_string);
            return Ok(ImportOp::Open(definition));
        }

        let kind = TransactionType::from_str(&self.kind)?;
        let date = match non_empty(&self.date) {
            Some(raw) => parse_business_date(raw)?,
            None => Utc::now().naive_utc(),
        };

        let mut draft = EntryDraft::new(kind, amount, date, created_by);
        if let Some(method) = non_empty(&self.method) {
            draft = draft.with_method(PaymentMethod::from_str(method)?);
        }
        if let Some(raw) = non_empty(&self.commission) {
            draft = draft.with_commission(Money::from_str(raw).map_err(|e| e.to_string())?);
        }
        if let Some(category) = non_empty(&self.category) {
            draft = draft.with_category(category);
        }
        if let Some(party) = non_empty(&self.party) {
            draft = draft.with_party(party);
        }
        if let Some(description) = non_empty(&self.description) {
            draft = draft.with_description(description);
        }
        if let Some(voucher) = non_empty(&self.voucher) {
            draft = draft.with_voucher(voucher);
        }

        Ok(ImportOp::Post {
            box_key: self.cash_box.trim().to_string(),
            draft,
        })
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and the `T`-separated forms.
pub fn parse_business_date(raw: &str) -> std::result::Result<NaiveDateTime, String> {
    let raw = raw.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("unrecognized date `{raw}`"))
}
