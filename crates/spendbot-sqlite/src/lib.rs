//! SQLite adapter for the expense store port.
//!
//! rusqlite is blocking, so each call checks a connection out of the r2d2 pool inside
//! `spawn_blocking`. The pooled connection is returned when the closure ends, whether
//! the query succeeded or not.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, types::Type, Connection, Row};
use tracing::info;

use spendbot_core::{
    domain::{ExpenseId, ExpenseRecord, StoredExpense},
    errors::Error,
    store::{DateRange, ExpenseStore},
    Result,
};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Fixed-width timestamp text so lexical order matches chronological order.
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const DATE_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const SELECT_COLUMNS: &str = "SELECT id, amount, category, currency, date FROM expenses";

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database file and run migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| Error::Store(format!("pool build failed: {e}")))?;

        let store = Self { pool, path };
        store.run_migrations()?;
        info!(path = %store.path.display(), "expense store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Store(format!("pool checkout failed: {e}")))?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL CHECK (length(category) > 0),
                currency TEXT NOT NULL,
                date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
            "#,
        )
        .map_err(store_err)
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| Error::Store(format!("pool checkout failed: {e}")))?;
            f(&*conn).map_err(store_err)
        })
        .await
        .map_err(|e| Error::Store(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl ExpenseStore for SqliteStore {
    async fn find_in_range(&self, range: DateRange) -> Result<Vec<StoredExpense>> {
        let start = range.start.format(DATE_FORMAT).to_string();
        let end = range.end.format(DATE_FORMAT).to_string();
        let sql = if range.end_inclusive {
            format!("{SELECT_COLUMNS} WHERE date >= ?1 AND date <= ?2 ORDER BY id ASC")
        } else {
            format!("{SELECT_COLUMNS} WHERE date >= ?1 AND date < ?2 ORDER BY id ASC")
        };

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![start, end], row_to_expense)?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })
        .await
    }

    async fn find_most_recent(&self, limit: usize) -> Result<Vec<StoredExpense>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY date DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], row_to_expense)?
                .collect::<rusqlite::Result<Vec<_>>>();
            rows
        })
        .await
    }

    async fn insert(&self, record: &ExpenseRecord) -> Result<ExpenseId> {
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO expenses (amount, category, currency, date) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.amount,
                    record.category,
                    record.currency,
                    record.date.format(DATE_FORMAT).to_string()
                ],
            )?;
            Ok(ExpenseId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn delete_by_id(&self, id: ExpenseId) -> Result<u64> {
        self.with_conn(move |conn| {
            let n = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id.0])?;
            Ok(n as u64)
        })
        .await
    }
}

fn row_to_expense(row: &Row<'_>) -> rusqlite::Result<StoredExpense> {
    let raw_date: String = row.get(4)?;
    let date = NaiveDateTime::parse_from_str(&raw_date, DATE_PARSE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(StoredExpense {
        id: ExpenseId(row.get(0)?),
        record: ExpenseRecord {
            amount: row.get(1)?,
            category: row.get(2)?,
            currency: row.get(3)?,
            date,
        },
    })
}

fn store_err(e: rusqlite::Error) -> Error {
    Error::Store(format!("sqlite error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct TempDb {
        path: PathBuf,
    }

    impl TempDb {
        fn new() -> Self {
            static COUNTER: AtomicU64 = AtomicU64::new(0);
            let id = COUNTER.fetch_add(1, Ordering::SeqCst);
            let path = std::env::temp_dir().join(format!(
                "spendbot-test-{}-{id}.db",
                std::process::id()
            ));
            let _ = std::fs::remove_file(&path);
            Self { path }
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
            let _ = std::fs::remove_file(self.path.with_extension("db-wal"));
            let _ = std::fs::remove_file(self.path.with_extension("db-shm"));
        }
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, d)
            .unwrap()
            .and_hms_milli_opt(h, m, 0, 250)
            .unwrap()
    }

    fn rec(amount: f64, category: &str, date: NaiveDateTime) -> ExpenseRecord {
        ExpenseRecord {
            amount,
            category: category.to_string(),
            currency: "₹".to_string(),
            date,
        }
    }

    #[tokio::test]
    async fn insert_then_read_back_round_trips_fields() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();

        let r = rec(12.5, "tea", at(19, 8, 15));
        let id = store.insert(&r).await.unwrap();

        let found = store
            .find_in_range(DateRange::half_open(at(19, 0, 0), at(20, 0, 0)))
            .await
            .unwrap();
        assert_eq!(found, vec![StoredExpense { id, record: r }]);
    }

    #[tokio::test]
    async fn range_bounds_follow_inclusivity() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();
        store.insert(&rec(1.0, "start", at(19, 0, 0))).await.unwrap();
        store.insert(&rec(2.0, "end", at(20, 0, 0))).await.unwrap();

        let half = store
            .find_in_range(DateRange::half_open(at(19, 0, 0), at(20, 0, 0)))
            .await
            .unwrap();
        assert_eq!(half.len(), 1);
        assert_eq!(half[0].record.category, "start");

        let closed = store
            .find_in_range(DateRange::closed(at(19, 0, 0), at(20, 0, 0)))
            .await
            .unwrap();
        assert_eq!(closed.len(), 2);
    }

    #[tokio::test]
    async fn range_results_are_in_insertion_order() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();
        store.insert(&rec(1.0, "late", at(19, 22, 0))).await.unwrap();
        store.insert(&rec(2.0, "early", at(19, 6, 0))).await.unwrap();

        let found = store
            .find_in_range(DateRange::closed(at(19, 0, 0), at(19, 23, 0)))
            .await
            .unwrap();
        let cats: Vec<_> = found.iter().map(|e| e.record.category.as_str()).collect();
        assert_eq!(cats, vec!["late", "early"]);
    }

    #[tokio::test]
    async fn most_recent_orders_by_date_then_id() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();
        store.insert(&rec(1.0, "a", at(19, 9, 0))).await.unwrap();
        store.insert(&rec(2.0, "b", at(19, 9, 0))).await.unwrap();
        store.insert(&rec(3.0, "c", at(18, 9, 0))).await.unwrap();

        let recent = store.find_most_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].record.category, "b");
    }

    #[tokio::test]
    async fn delete_by_id_reports_count() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();
        let id = store.insert(&rec(5.0, "gum", at(19, 9, 0))).await.unwrap();

        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(id).await.unwrap(), 0);
        assert!(store.find_most_recent(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let db = TempDb::new();
        {
            let store = SqliteStore::open(&db.path).unwrap();
            store.insert(&rec(7.0, "bus", at(19, 9, 0))).await.unwrap();
        }
        let store = SqliteStore::open(&db.path).unwrap();
        assert_eq!(store.find_most_recent(5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_records_are_store_errors() {
        let db = TempDb::new();
        let store = SqliteStore::open(&db.path).unwrap();
        let err = store.insert(&rec(-1.0, "neg", at(19, 9, 0))).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
    }
}
