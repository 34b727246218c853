//! Schema steps for the `sentiments` log. The applied step count lives in
//! `PRAGMA user_version`; each step and its version bump commit together.

use rusqlite::Connection;
use tracing::info;

use crate::history::StorageError;

const STEPS: &[(&str, &str)] = &[("v001_initial", include_str!("v001_initial.sql"))];

pub struct Migrator<'a> {
    conn: &'a Connection,
}

impl<'a> Migrator<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn schema_version(&self) -> Result<i32, StorageError> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    pub fn latest_version() -> i32 {
        STEPS.len() as i32
    }

    /// Bring the schema up to [`latest_version`](Self::latest_version).
    /// A file written by a newer build is refused rather than guessed at.
    pub fn migrate(&self) -> Result<(), StorageError> {
        let applied = self.schema_version()?;
        let latest = Self::latest_version();
        if applied > latest {
            return Err(StorageError::Migration(format!(
                "history schema v{applied} is newer than supported v{latest}"
            )));
        }

        for (version, (step, sql)) in (1..).zip(STEPS.iter()).skip(applied as usize) {
            info!(version, step = *step, "applying history schema step");
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(sql)
                .and_then(|_| tx.pragma_update(None, "user_version", version))
                .map_err(|e| StorageError::Migration(format!("{step}: {e}")))?;
            tx.commit()?;
        }
        Ok(())
    }
}
