use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ExpenseId, ExpenseRecord, StoredExpense},
    store::{DateRange, ExpenseStore},
    Result,
};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: Vec<StoredExpense>,
}

/// Vec-backed store with the same ordering rules as the SQLite adapter.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every row in insertion order.
    pub async fn all(&self) -> Vec<StoredExpense> {
        self.inner.lock().await.rows.clone()
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn find_in_range(&self, range: DateRange) -> Result<Vec<StoredExpense>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .iter()
            .filter(|e| range.contains(e.record.date))
            .cloned()
            .collect())
    }

    async fn find_most_recent(&self, limit: usize) -> Result<Vec<StoredExpense>> {
        let inner = self.inner.lock().await;
        let mut rows = inner.rows.clone();
        rows.sort_by(|a, b| {
            b.record
                .date
                .cmp(&a.record.date)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert(&self, record: &ExpenseRecord) -> Result<ExpenseId> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = ExpenseId(inner.next_id);
        inner.rows.push(StoredExpense {
            id,
            record: record.clone(),
        });
        Ok(id)
    }

    async fn delete_by_id(&self, id: ExpenseId) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.rows.len();
        inner.rows.retain(|e| e.id != id);
        Ok((before - inner.rows.len()) as u64)
    }
}
