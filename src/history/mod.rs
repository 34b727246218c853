//! history — append-only, SQLite-backed log of past classifications.
//!
//! Records are only ever created through [`HistoryStore::insert`]; there is no
//! update or delete path. Ids and ordering belong to the store. Reads come back
//! most recent first (`created_at DESC, id DESC`).
//!
//! One connection guarded by a mutex serializes writers; every insert runs in
//! its own transaction, so readers never see a partial record.

mod error;
mod migrations;

pub use error::StorageError;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::pagination::{self, PageNav, PageQuery};
use crate::sentiment::SentimentLabel;
use migrations::Migrator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub text: String,
    pub sentiment: SentimentLabel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub rows: Vec<HistoryRecord>,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub nav: PageNav,
}

#[derive(Debug)]
pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    /// Open (or create) the database file and apply pending migrations.
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("creating {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "history db open failed");
        })?;
        let store = Self::bootstrap(conn)?;
        info!(path = %path.display(), "history store opened");
        Ok(store)
    }

    /// In-memory database (tests, ephemeral runs).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        Migrator::new(&conn).migrate()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("connection mutex poisoned".into()))
    }

    /// Append one record; returns the id assigned by the store.
    pub fn insert(&self, text: &str, sentiment: SentimentLabel) -> Result<i64, StorageError> {
        let mut conn = self.lock()?;
        // stamped under the lock so timestamp order matches id order
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sentiments (text, sentiment, created_at) VALUES (?1, ?2, ?3)",
            params![text, sentiment.as_str(), created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(id, sentiment = %sentiment, "history record inserted");
        Ok(id)
    }

    /// String-typed variant of [`insert`](Self::insert) for callers holding the
    /// wire form. Unknown labels are rejected before the medium is touched.
    pub fn insert_record(&self, text: &str, sentiment: &str) -> Result<i64, StorageError> {
        let label = sentiment
            .parse::<SentimentLabel>()
            .map_err(|e| StorageError::InvalidRecord(e.to_string()))?;
        self.insert(text, label)
    }

    /// Most recent first. Fewer than `limit` rows near the end of the log;
    /// empty (not an error) once `offset >= total count`.
    pub fn get_latest(&self, limit: u32, offset: u64) -> Result<Vec<HistoryRecord>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let raw: Vec<(i64, String, String, String)> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare_cached(
                "SELECT id, text, sentiment, created_at FROM sentiments
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt.query_map(params![i64::from(limit), offset], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?;
            let out = rows.collect::<Result<Vec<_>, _>>()?;
            out
        };

        raw.into_iter().map(to_record).collect()
    }

    /// Exact number of records ever inserted.
    pub fn get_total_count(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM sentiments", [], |r| r.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Count + page arithmetic + fetch. Out-of-range pages are clamped.
    pub fn page(&self, query: PageQuery) -> Result<PageResult, StorageError> {
        let q = PageQuery::new(query.page, query.per_page);
        let total_count = self.get_total_count()?;
        let total_pages = pagination::total_pages(total_count, q.per_page);
        let page = pagination::clamp_page(q.page, total_pages);
        let rows = self.get_latest(q.per_page, pagination::offset_for(page, q.per_page))?;

        Ok(PageResult {
            rows,
            page,
            per_page: q.per_page,
            total_pages,
            total_count,
            nav: PageNav::new(page, total_pages),
        })
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<(), StorageError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }
}

fn to_record(
    (id, text, sentiment, created_at): (i64, String, String, String),
) -> Result<HistoryRecord, StorageError> {
    let sentiment = sentiment
        .parse::<SentimentLabel>()
        .map_err(|e| StorageError::CorruptRecord {
            id,
            reason: e.to_string(),
        })?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StorageError::CorruptRecord {
            id,
            reason: format!("created_at {created_at:?}: {e}"),
        })?
        .with_timezone(&Utc);
    Ok(HistoryRecord {
        id,
        text,
        sentiment,
        created_at,
    })
}
