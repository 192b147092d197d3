//! Idempotency keys of processed distributions.

use encore_types::{EntryId, SharedEarningsId};
use rusqlite::{Connection, OptionalExtension};

use crate::{columns, constraint, DbError, Result};

/// What a processed idempotency key resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistributionRef {
    /// A split: the shared earnings record.
    Shared(SharedEarningsId),
    /// No affiliation: the single artist entry.
    Entry(EntryId),
}

/// Record the outcome for `key`. A second insert of the same key is a
/// constraint error.
pub fn insert(conn: &Connection, key: &str, outcome: DistributionRef, now: u64) -> Result<()> {
    let (shared, entry) = match outcome {
        DistributionRef::Shared(id) => (Some(id.to_string()), None),
        DistributionRef::Entry(id) => (None, Some(id.to_string())),
    };
    conn.execute(
        "INSERT INTO distributions (idempotency_key, shared_earnings_id, entry_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![key, shared, entry, now as i64],
    )
    .map_err(|e| constraint(e, "distribution key"))?;
    Ok(())
}

/// Look up a previously processed key.
pub fn get(conn: &Connection, key: &str) -> Result<Option<DistributionRef>> {
    let row = conn
        .query_row(
            "SELECT shared_earnings_id, entry_id FROM distributions WHERE idempotency_key = ?1",
            [key],
            |row| Ok((columns::opt_uuid(row, 0)?, columns::opt_uuid(row, 1)?)),
        )
        .optional()?;

    match row {
        None => Ok(None),
        Some((Some(shared), None)) => Ok(Some(DistributionRef::Shared(shared))),
        Some((None, Some(entry))) => Ok(Some(DistributionRef::Entry(entry))),
        Some(_) => Err(DbError::Serialization(format!(
            "distribution key {key:?} has no single outcome"
        ))),
    }
}
