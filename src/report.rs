//! Monthly and yearly cash box summaries.
//!
//! Totals are sums of net amounts, the same figures the balance projection
//! uses, so a month's closing balance always equals its opening balance plus
//! net profit.

use crate::entry::{LedgerEntry, TransactionType};
use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::projector::{project, sort_entries};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Label used for entries without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Totals for one category within one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub amount: Money,
    pub transaction_count: usize,
    /// Share of the type's total, in percent with 2 decimals.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    pub month: u32,
    pub year: i32,
    pub total_income: Money,
    pub total_expense: Money,
    pub net_profit: Money,
    /// Balance before the month's first entry.
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub income_count: usize,
    pub expense_count: usize,
    pub income_by_category: Vec<CategorySummary>,
    pub expense_by_category: Vec<CategorySummary>,
    /// The month's entries in history order.
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub total_income: Money,
    pub total_expense: Money,
    pub net_profit: Money,
    pub average_monthly_income: Money,
    pub average_monthly_expense: Money,
    pub monthly: Vec<MonthlyReport>,
}

fn in_month(entry: &LedgerEntry, month: u32, year: i32) -> bool {
    let date = entry.transaction_date();
    date.year() == year && date.month() == month
}

fn before_month(entry: &LedgerEntry, month: u32, year: i32) -> bool {
    let date = entry.transaction_date();
    (date.year(), date.month()) < (year, month)
}

/// Sums net amounts, failing if the total leaves the money range.
fn total<'a, I>(cash_box_id: Uuid, entries: I) -> Result<Money>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries.into_iter().try_fold(Money::ZERO, |acc, e| {
        acc.checked_add(e.net_amount())
            .ok_or(LedgerError::BalanceOverflow(cash_box_id))
    })
}

/// Builds the report for `month`/`year` from a box's opening balance and its
/// full history (any order).
pub fn monthly_report(
    cash_box_id: Uuid,
    opening_balance: Money,
    history: &[LedgerEntry],
    month: u32,
    year: i32,
) -> Result<MonthlyReport> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::InvalidPeriod { month, year });
    }
    let overflow = || LedgerError::BalanceOverflow(cash_box_id);

    let mut ordered = history.to_vec();
    sort_entries(&mut ordered);

    let month_opening = project(
        opening_balance,
        ordered
            .iter()
            .filter(|e| before_month(e, month, year))
            .map(|e| (e.kind(), e.net_amount())),
    )
    .ok_or_else(overflow)?;

    let entries: Vec<LedgerEntry> = ordered
        .into_iter()
        .filter(|e| in_month(e, month, year))
        .collect();

    let (incomes, expenses): (Vec<&LedgerEntry>, Vec<&LedgerEntry>) = entries
        .iter()
        .partition(|e| e.kind() == TransactionType::Income);

    let total_income = total(cash_box_id, incomes.iter().copied())?;
    let total_expense = total(cash_box_id, expenses.iter().copied())?;
    let net_profit = total_income
        .checked_sub(total_expense)
        .ok_or_else(overflow)?;
    let closing_balance = month_opening.checked_add(net_profit).ok_or_else(overflow)?;

    Ok(MonthlyReport {
        month,
        year,
        total_income,
        total_expense,
        net_profit,
        opening_balance: month_opening,
        closing_balance,
        income_count: incomes.len(),
        expense_count: expenses.len(),
        income_by_category: by_category(cash_box_id, &incomes, total_income)?,
        expense_by_category: by_category(cash_box_id, &expenses, total_expense)?,
        entries,
    })
}

/// Twelve monthly reports plus yearly totals and monthly averages.
pub fn yearly_report(
    cash_box_id: Uuid,
    opening_balance: Money,
    history: &[LedgerEntry],
    year: i32,
) -> Result<YearlyReport> {
    let overflow = || LedgerError::BalanceOverflow(cash_box_id);
    let monthly = (1..=12)
        .map(|month| monthly_report(cash_box_id, opening_balance, history, month, year))
        .collect::<Result<Vec<_>>>()?;

    let mut total_income = Money::ZERO;
    let mut total_expense = Money::ZERO;
    for report in &monthly {
        total_income = total_income
            .checked_add(report.total_income)
            .ok_or_else(overflow)?;
        total_expense = total_expense
            .checked_add(report.total_expense)
            .ok_or_else(overflow)?;
    }
    let twelve = Decimal::from(12);

    Ok(YearlyReport {
        year,
        total_income,
        total_expense,
        net_profit: total_income
            .checked_sub(total_expense)
            .ok_or_else(overflow)?,
        average_monthly_income: Money::new(total_income.as_decimal() / twelve),
        average_monthly_expense: Money::new(total_expense.as_decimal() / twelve),
        monthly,
    })
}

fn by_category(
    cash_box_id: Uuid,
    entries: &[&LedgerEntry],
    total: Money,
) -> Result<Vec<CategorySummary>> {
    let mut groups: HashMap<&str, (Money, usize)> = HashMap::new();
    for entry in entries {
        let key = match entry.category().trim() {
            "" => UNCATEGORIZED,
            other => other,
        };
        let slot = groups.entry(key).or_insert((Money::ZERO, 0));
        slot.0 = slot
            .0
            .checked_add(entry.net_amount())
            .ok_or(LedgerError::BalanceOverflow(cash_box_id))?;
        slot.1 += 1;
    }

    let mut summaries: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (amount, transaction_count))| CategorySummary {
            category: category.to_string(),
            amount,
            transaction_count,
            percentage: percentage_of(amount, total),
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    Ok(summaries)
}

fn percentage_of(part: Money, total: Money) -> Decimal {
    if !total.is_positive() {
        return Decimal::ZERO;
    }
    (part.as_decimal() * Decimal::ONE_HUNDRED / total.as_decimal()).round_dp(2)
}
