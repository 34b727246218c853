//! History store error types

use thiserror::Error;

/// Any failure of the persistence medium. Always propagated to the caller:
/// a silently lost write would break `count == successful inserts`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("history store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: i64, reason: String },
}
