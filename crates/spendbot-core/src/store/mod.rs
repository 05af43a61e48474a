//! Persistence port for expense records.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::{
    domain::{ExpenseId, ExpenseRecord, StoredExpense},
    Result,
};

pub mod memory;

/// A date window. The start is always inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub end_inclusive: bool,
}

impl DateRange {
    /// `[start, end)`
    pub fn half_open(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            end_inclusive: false,
        }
    }

    /// `[start, end]`
    pub fn closed(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            end_inclusive: true,
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && (t < self.end || (self.end_inclusive && t == self.end))
    }
}

/// Hexagonal port for the expense collection.
///
/// Implementations own their connection handling: every call acquires what it needs
/// and releases it before returning, on success and on error.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Records whose date falls in `range`, in insertion order.
    async fn find_in_range(&self, range: DateRange) -> Result<Vec<StoredExpense>>;

    /// Newest records first: by date, then by insertion sequence.
    async fn find_most_recent(&self, limit: usize) -> Result<Vec<StoredExpense>>;

    async fn insert(&self, record: &ExpenseRecord) -> Result<ExpenseId>;

    /// Number of records removed (0 or 1).
    async fn delete_by_id(&self, id: ExpenseId) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn half_open_excludes_end() {
        let r = DateRange::half_open(t(1), t(5));
        assert!(r.contains(t(1)));
        assert!(r.contains(t(4)));
        assert!(!r.contains(t(5)));
        assert!(!r.contains(t(0)));
    }

    #[test]
    fn closed_includes_end() {
        let r = DateRange::closed(t(1), t(5));
        assert!(r.contains(t(5)));
        assert!(!r.contains(t(6)));
    }
}
