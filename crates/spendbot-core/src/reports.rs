//! Read/aggregate/delete routines behind the fixed commands.
//!
//! Every function takes the request's `now`; none of them read the clock.

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::{
    dates,
    domain::StoredExpense,
    store::{DateRange, ExpenseStore},
    Result,
};

pub const NO_EXPENSES_TODAY: &str = "📭 No expenses recorded today.";
pub const NO_EXPENSES_THIS_WEEK: &str = "📭 No expenses recorded this week.";
pub const NO_EXPENSES_THIS_MONTH: &str = "📭 No expenses recorded this month.";
pub const NOTHING_TO_DELETE: &str = "📭 No expense found to delete.";
pub const DELETE_FAILED: &str = "❌ Could not delete the last entry.";

pub fn help() -> String {
    [
        "📋 Available Commands:",
        "- Spent 100 on tea",
        "- today / week / month",
        "- delete last",
        "- bill for [date]",
        "- help",
    ]
    .join("\n")
}

// ============== Ranges ==============

pub fn today_range(now: NaiveDateTime) -> DateRange {
    let today = now.date();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    DateRange::half_open(dates::midnight(today), dates::midnight(tomorrow))
}

pub fn week_range(now: NaiveDateTime) -> DateRange {
    DateRange::closed(dates::start_of_week(now), now)
}

pub fn month_range(now: NaiveDateTime) -> DateRange {
    DateRange::closed(dates::start_of_month(now), now)
}

pub fn day_range(day: NaiveDate) -> DateRange {
    DateRange::closed(dates::midnight(day), dates::end_of_day(day))
}

// ============== Reports ==============

pub async fn today(store: &dyn ExpenseStore, now: NaiveDateTime) -> Result<String> {
    let expenses = store.find_in_range(today_range(now)).await?;
    if expenses.is_empty() {
        return Ok(NO_EXPENSES_TODAY.to_string());
    }
    Ok(format!("📅 Today's Expenses:\n{}", item_lines(&expenses)))
}

pub async fn week(store: &dyn ExpenseStore, now: NaiveDateTime) -> Result<String> {
    let expenses = store.find_in_range(week_range(now)).await?;
    if expenses.is_empty() {
        return Ok(NO_EXPENSES_THIS_WEEK.to_string());
    }
    Ok(format!(
        "📊 Weekly Category Totals:\n{}",
        total_lines(&category_totals(&expenses))
    ))
}

pub async fn month(store: &dyn ExpenseStore, now: NaiveDateTime) -> Result<String> {
    let expenses = store.find_in_range(month_range(now)).await?;
    if expenses.is_empty() {
        return Ok(NO_EXPENSES_THIS_MONTH.to_string());
    }
    Ok(format!(
        "📅 Monthly Category Totals:\n{}",
        total_lines(&category_totals(&expenses))
    ))
}

/// Expenses on day `day` of the current month.
///
/// `day` is not checked against the month length; see [`dates::day_of_month`].
pub async fn bill_for_day(
    store: &dyn ExpenseStore,
    now: NaiveDateTime,
    day: u32,
) -> Result<String> {
    let target = dates::day_of_month(now, day);
    let expenses = store.find_in_range(day_range(target)).await?;
    let label = dates::display_date(target);
    if expenses.is_empty() {
        return Ok(format!("📭 No expenses recorded on {label}"));
    }
    Ok(format!("📅 Expenses on {label}:\n{}", item_lines(&expenses)))
}

pub async fn delete_last(store: &dyn ExpenseStore) -> Result<String> {
    let Some(last) = store.find_most_recent(1).await?.into_iter().next() else {
        return Ok(NOTHING_TO_DELETE.to_string());
    };

    let deleted = store.delete_by_id(last.id).await?;
    if deleted == 0 {
        warn!(id = last.id.0, "most recent expense vanished before delete");
        return Ok(DELETE_FAILED.to_string());
    }

    info!(
        id = last.id.0,
        amount = last.record.amount,
        category = %last.record.category,
        "deleted last expense"
    );
    Ok(format!(
        "🗑️ Deleted last entry: {}{} for {}",
        last.record.currency,
        format_amount(last.record.amount),
        last.record.category
    ))
}

// ============== Aggregation + Rendering ==============

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub currency: String,
    pub total: f64,
}

/// Sum amounts per category, keeping the order in which categories first appear.
pub fn category_totals(expenses: &[StoredExpense]) -> Vec<CategoryTotal> {
    let mut out: Vec<CategoryTotal> = Vec::new();
    for e in expenses {
        match out.iter_mut().find(|t| t.category == e.record.category) {
            // Saturate rather than overflow to infinity.
            Some(t) => t.total = (t.total + e.record.amount).min(f64::MAX),
            None => out.push(CategoryTotal {
                category: e.record.category.clone(),
                currency: e.record.currency.clone(),
                total: e.record.amount,
            }),
        }
    }
    out
}

/// Render an amount with at most two decimals and no trailing zeros.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{amount:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        return "0".to_string();
    }
    trimmed.to_string()
}

fn item_lines(expenses: &[StoredExpense]) -> String {
    expenses
        .iter()
        .map(|e| {
            format!(
                "- {}{} for {}",
                e.record.currency,
                format_amount(e.record.amount),
                e.record.category
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn total_lines(totals: &[CategoryTotal]) -> String {
    totals
        .iter()
        .map(|t| format!("- {}: {}{}", t.category, t.currency, format_amount(t.total)))
        .collect::<Vec<_>>()
        .join("\n")
}
