//! Library-level scenarios for the cash-box ledger.

use cashbox_ledger::{
    CashBoxDefinition, CashBoxLedger, EntryDraft, LedgerConfig, LedgerError, Money,
    PaymentMethod, TransactionType,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

fn m(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

fn day(d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, d)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn ledger_with_box(opening: &str) -> (CashBoxLedger, uuid::Uuid) {
    let ledger = CashBoxLedger::default();
    let cb = ledger
        .create_cash_box(CashBoxDefinition::new("Main", m(opening), "admin"))
        .unwrap();
    (ledger, cb.id)
}

#[test]
fn test_expense_then_instapay_income_scenario() {
    let (ledger, id) = ledger_with_box("500.00");

    ledger
        .post_transaction(
            id,
            EntryDraft::expense(m("120.00"), day(1), "clerk").with_method(PaymentMethod::Cash),
        )
        .unwrap();
    assert_eq!(ledger.current_balance(id).unwrap(), m("380.00"));

    let income = ledger
        .post_transaction(
            id,
            EntryDraft::income(m("200.00"), day(2), "clerk")
                .with_method(PaymentMethod::InstaPay)
                .with_commission(m("6.00")),
        )
        .unwrap();
    assert_eq!(income.net_amount(), m("194.00"));
    assert_eq!(ledger.current_balance(id).unwrap(), m("574.00"));

    let rec = ledger.reconcile(id).unwrap();
    assert!(rec.matches_cached);
    assert_eq!(rec.computed_balance, m("574.00"));
    assert_eq!(rec.entry_count, 2);
}

#[test]
fn test_instapay_commission_reduces_income() {
    let (ledger, id) = ledger_with_box("0");

    let entry = ledger
        .post_transaction(
            id,
            EntryDraft::income(m("100"), day(1), "clerk")
                .with_method(PaymentMethod::InstaPay)
                .with_commission(m("3")),
        )
        .unwrap();

    assert_eq!(entry.amount(), m("100"));
    assert_eq!(entry.commission(), Some(m("3")));
    assert_eq!(entry.net_amount(), m("97"));
    assert_eq!(ledger.current_balance(id).unwrap(), m("97"));
}

#[test]
fn test_unexpected_commission_leaves_balance_unchanged() {
    let (ledger, id) = ledger_with_box("50");

    for method in [
        PaymentMethod::Cash,
        PaymentMethod::BankTransfer,
        PaymentMethod::Cheque,
        PaymentMethod::CreditCard,
        PaymentMethod::Other,
    ] {
        let err = ledger
            .post_transaction(
                id,
                EntryDraft::income(m("10"), day(1), "clerk")
                    .with_method(method)
                    .with_commission(m("1")),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnexpectedCommission { .. }));
        assert!(err.is_validation());
    }

    assert_eq!(ledger.current_balance(id).unwrap(), m("50"));
    assert!(ledger.get_transactions(id, None).unwrap().is_empty());
}

#[test]
fn test_reconcile_after_many_mixed_posts() {
    let (ledger, id) = ledger_with_box("1000");

    let mut expected = m("1000");
    for i in 1..=40u32 {
        let amount = Money::from_minor(i64::from(i) * 137);
        let draft = if i % 3 == 0 {
            expected -= amount;
            EntryDraft::expense(amount, day(i % 28 + 1), "clerk")
        } else if i % 5 == 0 {
            let commission = Money::from_minor(i64::from(i));
            expected += amount - commission;
            EntryDraft::income(amount, day(i % 28 + 1), "clerk")
                .with_method(PaymentMethod::InstaPay)
                .with_commission(commission)
        } else {
            expected += amount;
            EntryDraft::income(amount, day(i % 28 + 1), "clerk")
        };
        ledger.post_transaction(id, draft).unwrap();

        assert!(ledger.reconcile(id).unwrap().matches_cached);
    }

    assert_eq!(ledger.current_balance(id).unwrap(), expected);
}

#[test]
fn test_backdated_entries_still_reconcile() {
    let (ledger, id) = ledger_with_box("10");

    ledger
        .post_transaction(id, EntryDraft::income(m("5"), day(20), "clerk"))
        .unwrap();
    let backdated = ledger
        .post_transaction(id, EntryDraft::expense(m("30"), day(2), "clerk"))
        .unwrap();

    // Snapshots follow posting order; history order follows business dates.
    assert_eq!(backdated.balance_before(), m("15"));
    assert_eq!(backdated.balance_after(), m("-15"));

    let history = ledger.get_transactions(id, None).unwrap();
    assert_eq!(history[0].id(), backdated.id());
    assert_eq!(history[0].kind(), TransactionType::Expense);

    let rec = ledger.reconcile(id).unwrap();
    assert!(rec.matches_cached);
    assert_eq!(rec.computed_balance, m("-15"));
}

#[test]
fn test_overdraft_is_allowed() {
    let (ledger, id) = ledger_with_box("0");
    ledger
        .post_transaction(id, EntryDraft::expense(m("75.25"), day(1), "clerk"))
        .unwrap();
    assert_eq!(ledger.current_balance(id).unwrap().to_string(), "-75.25");
}

#[test]
fn test_create_with_empty_name_creates_nothing() {
    let ledger = CashBoxLedger::default();
    let err = ledger
        .create_cash_box(CashBoxDefinition::new("", m("10"), "admin"))
        .unwrap_err();

    assert!(matches!(err, LedgerError::InvalidName));
    assert!(ledger.get_all_cash_boxes().unwrap().is_empty());
}

#[test]
fn test_update_cannot_touch_balance() {
    let (ledger, id) = ledger_with_box("100");
    let mut edited = ledger.get_cash_box(id).unwrap();
    edited.current_balance = m("1000000");

    assert!(matches!(
        ledger.update_cash_box(&edited),
        Err(LedgerError::ImmutableFieldModified { field: "current_balance", .. })
    ));
    assert_eq!(ledger.current_balance(id).unwrap(), m("100"));
}

#[test]
fn test_inactive_box_history_stays_readable() {
    let (ledger, id) = ledger_with_box("100");
    ledger
        .post_transaction(id, EntryDraft::income(m("1"), day(1), "clerk"))
        .unwrap();
    ledger.set_cash_box_active(id, false, "manager").unwrap();

    let err = ledger
        .post_transaction(id, EntryDraft::income(m("1"), day(2), "clerk"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::CashBoxInactive(_)));
    assert_eq!(ledger.get_transactions(id, None).unwrap().len(), 1);
    assert!(ledger.reconcile(id).unwrap().matches_cached);
    assert!(ledger.get_active_cash_boxes().unwrap().is_empty());

    ledger.set_cash_box_active(id, true, "manager").unwrap();
    ledger
        .post_transaction(id, EntryDraft::income(m("1"), day(3), "clerk"))
        .unwrap();
    assert_eq!(ledger.current_balance(id).unwrap(), m("102"));
}

#[test]
fn test_inactive_postings_allowed_by_config() {
    let ledger = CashBoxLedger::new(LedgerConfig {
        allow_inactive_postings: true,
        ..LedgerConfig::default()
    });
    let cb = ledger
        .create_cash_box(CashBoxDefinition::new("Archive", m("0"), "admin").inactive())
        .unwrap();

    ledger
        .post_transaction(cb.id, EntryDraft::income(m("9"), day(1), "clerk"))
        .unwrap();
    assert_eq!(ledger.current_balance(cb.id).unwrap(), m("9"));
}

#[test]
fn test_reversal_restores_balance() {
    let (ledger, id) = ledger_with_box("300");
    let expense = ledger
        .post_transaction(
            id,
            EntryDraft::expense(m("80"), day(1), "clerk").with_voucher("55"),
        )
        .unwrap();

    let offset = ledger.reverse_transaction(expense.id(), day(2), "manager").unwrap();

    assert_eq!(offset.kind(), TransactionType::Income);
    assert_eq!(offset.description(), "Reversal of 55");
    assert_eq!(offset.voucher_number(), Some("56"));
    assert_eq!(ledger.current_balance(id).unwrap(), m("300"));
    assert_eq!(ledger.get_transaction(expense.id()).unwrap(), expense);
    assert_eq!(ledger.last_voucher_number(id).unwrap().as_deref(), Some("56"));
}

#[test]
fn test_monthly_and_yearly_reports() {
    let (ledger, id) = ledger_with_box("500");
    ledger
        .post_transaction(
            id,
            EntryDraft::expense(m("120"), day(5), "clerk").with_category("Rent"),
        )
        .unwrap();
    ledger
        .post_transaction(
            id,
            EntryDraft::income(m("200"), day(6), "clerk")
                .with_method(PaymentMethod::InstaPay)
                .with_commission(m("6"))
                .with_category("Sales"),
        )
        .unwrap();

    let january = ledger.monthly_report(id, 1, 2026).unwrap();
    assert_eq!(january.total_income, m("194"));
    assert_eq!(january.total_expense, m("120"));
    assert_eq!(january.opening_balance, m("500"));
    assert_eq!(january.closing_balance, ledger.current_balance(id).unwrap());

    let year = ledger.yearly_report(id, 2026).unwrap();
    assert_eq!(year.net_profit, m("74"));
    assert_eq!(year.monthly[1].opening_balance, m("574"));

    assert!(matches!(
        ledger.monthly_report(id, 0, 2026),
        Err(LedgerError::InvalidPeriod { .. })
    ));
}
