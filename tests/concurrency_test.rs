//! Concurrent postings: no lost updates on one box, no cross-box blocking.

use cashbox_ledger::{
    CashBox, CashBoxDefinition, CashBoxLedger, EntryDraft, InMemoryStore, LedgerConfig,
    LedgerEntry, LedgerStore, Money, PaymentMethod,
};
use cashbox_ledger::store::{CashBoxMetadata, StoreResult};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

fn m(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

fn date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

#[test]
fn test_hundred_concurrent_posts_lose_nothing() {
    let ledger = Arc::new(CashBoxLedger::default());
    let cb = ledger
        .create_cash_box(CashBoxDefinition::new("Till", Money::ZERO, "admin"))
        .unwrap();

    let barrier = Arc::new(Barrier::new(100));
    let handles: Vec<_> = (0..100)
        .map(|i| {
            let ledger = Arc::clone(&ledger);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ledger
                    .post_transaction(cb.id, EntryDraft::income(m("1"), date(), format!("user{i}")))
                    .unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(ledger.current_balance(cb.id).unwrap(), m("100"));
    let rec = ledger.reconcile(cb.id).unwrap();
    assert!(rec.matches_cached);
    assert_eq!(rec.entry_count, 100);
}

#[test]
fn test_concurrent_mixed_posts_match_some_sequential_order() {
    let ledger = Arc::new(CashBoxLedger::default());
    let cb = ledger
        .create_cash_box(CashBoxDefinition::new("Till", m("250"), "admin"))
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..25 {
                    let draft = match (t + i) % 3 {
                        0 => EntryDraft::expense(m("2.50"), date(), "clerk"),
                        1 => EntryDraft::income(m("10"), date(), "clerk")
                            .with_method(PaymentMethod::InstaPay)
                            .with_commission(m("0.50")),
                        _ => EntryDraft::income(m("1.25"), date(), "clerk"),
                    };
                    ledger.post_transaction(cb.id, draft).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let entries = ledger.get_transactions(cb.id, None).unwrap();
    assert_eq!(entries.len(), 400);

    let expected = entries
        .iter()
        .fold(m("250"), |balance, e| balance + e.net_effect());
    assert_eq!(ledger.current_balance(cb.id).unwrap(), expected);
    assert!(ledger.reconcile(cb.id).unwrap().matches_cached);

    // Every snapshot starts where another posting ended: postings were linearized.
    let afters: HashSet<Money> = entries.iter().map(|e| e.balance_after()).collect();
    assert!(entries
        .iter()
        .filter(|e| e.balance_before() != m("250"))
        .all(|e| afters.contains(&e.balance_before())));
}

/// Store that stalls commits for one particular box.
struct SlowBoxStore {
    inner: InMemoryStore,
    slow_box: Mutex<Option<Uuid>>,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<Option<mpsc::Receiver<()>>>,
}

impl LedgerStore for SlowBoxStore {
    fn insert_cash_box(&self, cash_box: &CashBox) -> StoreResult<()> {
        self.inner.insert_cash_box(cash_box)
    }
    fn load_cash_box(&self, id: Uuid) -> StoreResult<Option<CashBox>> {
        self.inner.load_cash_box(id)
    }
    fn list_cash_boxes(&self) -> StoreResult<Vec<CashBox>> {
        self.inner.list_cash_boxes()
    }
    fn count_cash_boxes(&self) -> StoreResult<usize> {
        self.inner.count_cash_boxes()
    }
    fn save_cash_box_metadata(&self, id: Uuid, metadata: &CashBoxMetadata) -> StoreResult<()> {
        self.inner.save_cash_box_metadata(id, metadata)
    }
    fn commit_posting(&self, entry: &LedgerEntry, new_balance: Money) -> StoreResult<()> {
        let is_slow = *self.slow_box.lock().unwrap() == Some(entry.cash_box_id());
        if is_slow {
            if let Some(tx) = self.entered.lock().unwrap().take() {
                tx.send(()).unwrap();
            }
            if let Some(rx) = self.release.lock().unwrap().take() {
                rx.recv_timeout(Duration::from_secs(10)).unwrap();
            }
        }
        self.inner.commit_posting(entry, new_balance)
    }
    fn entries_for(&self, cash_box_id: Uuid) -> StoreResult<Vec<LedgerEntry>> {
        self.inner.entries_for(cash_box_id)
    }
    fn load_entry(&self, id: Uuid) -> StoreResult<Option<LedgerEntry>> {
        self.inner.load_entry(id)
    }
}

#[test]
fn test_other_boxes_are_not_blocked() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(SlowBoxStore {
        inner: InMemoryStore::new(),
        slow_box: Mutex::new(None),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(Some(release_rx)),
    });
    let ledger = Arc::new(CashBoxLedger::with_store(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        LedgerConfig::default(),
    ));

    let slow = ledger
        .create_cash_box(CashBoxDefinition::new("Slow", Money::ZERO, "admin"))
        .unwrap();
    let fast = ledger
        .create_cash_box(CashBoxDefinition::new("Fast", Money::ZERO, "admin"))
        .unwrap();
    *store.slow_box.lock().unwrap() = Some(slow.id);

    // Park a posting inside the slow box's critical section.
    let parked = {
        let ledger = Arc::clone(&ledger);
        thread::spawn(move || {
            ledger
                .post_transaction(slow.id, EntryDraft::income(m("1"), date(), "clerk"))
                .unwrap()
        })
    };
    entered_rx.recv_timeout(Duration::from_secs(10)).unwrap();

    // The fast box must make progress while the slow box's guard is held.
    for _ in 0..10 {
        ledger
            .post_transaction(fast.id, EntryDraft::income(m("2"), date(), "clerk"))
            .unwrap();
    }
    assert_eq!(ledger.current_balance(fast.id).unwrap(), m("20"));
    assert_eq!(ledger.current_balance(slow.id).unwrap(), Money::ZERO);

    release_tx.send(()).unwrap();
    parked.join().unwrap();
    assert_eq!(ledger.current_balance(slow.id).unwrap(), m("1"));
}
