//! # encore-db
//!
//! Persistence layer for the Encore ledger: one SQLite database file shared
//! by every worker, each worker holding its own [`Connection`].
//!
//! ## Schema
//!
//! - WAL mode, so readers never block the single writer
//! - Foreign keys enforced
//! - Money and percentages stored as canonical decimal text, never REAL
//! - Ledger value columns guarded by triggers (append-and-transition only)
//! - All timestamps are Unix epoch seconds (u64)
//! - Schema version stored in `PRAGMA user_version`

mod columns;
pub mod migrations;
pub mod queries;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Default time a connection waits for the write lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the ledger database at the given path.
///
/// Configures pragmas and runs any pending migrations. Call once at startup;
/// workers then use [`connect`].
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an additional connection to an already-migrated database.
pub fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn, busy_timeout)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn, DEFAULT_BUSY_TIMEOUT)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

/// Map a unique/check constraint failure to [`DbError::Constraint`], leaving
/// every other error untouched.
pub(crate) fn constraint(err: rusqlite::Error, what: &str) -> DbError {
    match err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!(
                "{what}: {}",
                msg.unwrap_or_else(|| e.to_string())
            ))
        }
        other => DbError::Sqlite(other),
    }
}
