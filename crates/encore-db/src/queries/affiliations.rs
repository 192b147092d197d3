//! Label/artist affiliation query functions.

use encore_types::split::{Affiliation, AffiliationStatus};
use encore_types::AffiliationId;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{columns, constraint, Result};

const AFFILIATION_COLUMNS: &str =
    "id, label_admin_id, artist_id, label_percentage, status, effective_from, effective_until";

fn map_affiliation(row: &Row<'_>) -> rusqlite::Result<Affiliation> {
    Ok(Affiliation {
        id: columns::uuid(row, 0)?,
        label_admin_id: row.get(1)?,
        artist_id: row.get(2)?,
        label_percentage: columns::opt_decimal(row, 3)?,
        status: columns::tag(row, 4)?,
        effective_from: columns::timestamp(row, 5)?,
        effective_until: columns::opt_timestamp(row, 6)?,
    })
}

/// Insert an affiliation. Fails with a constraint error if the pair already
/// has an active affiliation.
pub fn insert(conn: &Connection, affiliation: &Affiliation, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO affiliations
         (id, label_admin_id, artist_id, label_percentage, status,
          effective_from, effective_until, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            affiliation.id.to_string(),
            affiliation.label_admin_id,
            affiliation.artist_id,
            affiliation.label_percentage.map(|p| p.to_string()),
            affiliation.status.as_str(),
            affiliation.effective_from as i64,
            affiliation.effective_until.map(|t| t as i64),
            created_at as i64,
        ],
    )
    .map_err(|e| constraint(e, "affiliation"))?;
    Ok(())
}

/// Fetch one affiliation.
pub fn get(conn: &Connection, id: &AffiliationId) -> Result<Option<Affiliation>> {
    let affiliation = conn
        .query_row(
            &format!("SELECT {AFFILIATION_COLUMNS} FROM affiliations WHERE id = ?1"),
            [id.to_string()],
            map_affiliation,
        )
        .optional()?;
    Ok(affiliation)
}

/// The artist's effective affiliation at `now`. When several labels are
/// active at once, the one that became effective most recently wins.
pub fn active_for_artist(
    conn: &Connection,
    artist_id: &str,
    now: u64,
) -> Result<Option<Affiliation>> {
    let affiliation = conn
        .query_row(
            &format!(
                "SELECT {AFFILIATION_COLUMNS} FROM affiliations
                 WHERE artist_id = ?1 AND status = 'active'
                   AND effective_from <= ?2
                   AND (effective_until IS NULL OR effective_until > ?2)
                 ORDER BY effective_from DESC, created_at DESC, rowid DESC
                 LIMIT 1"
            ),
            rusqlite::params![artist_id, now as i64],
            map_affiliation,
        )
        .optional()?;
    Ok(affiliation)
}

/// The active affiliation row for a (label admin, artist) pair, regardless of
/// its effective window.
pub fn active_for_pair(
    conn: &Connection,
    label_admin_id: &str,
    artist_id: &str,
) -> Result<Option<Affiliation>> {
    let affiliation = conn
        .query_row(
            &format!(
                "SELECT {AFFILIATION_COLUMNS} FROM affiliations
                 WHERE label_admin_id = ?1 AND artist_id = ?2 AND status = 'active'"
            ),
            rusqlite::params![label_admin_id, artist_id],
            map_affiliation,
        )
        .optional()?;
    Ok(affiliation)
}

/// Every affiliation a label admin has ever had, newest first.
pub fn for_label(conn: &Connection, label_admin_id: &str) -> Result<Vec<Affiliation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AFFILIATION_COLUMNS} FROM affiliations
         WHERE label_admin_id = ?1
         ORDER BY effective_from DESC, rowid DESC"
    ))?;

    let rows = stmt
        .query_map([label_admin_id], map_affiliation)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Mark an active affiliation inactive, closing its window at `now`.
///
/// Returns `false` if it was not active.
pub fn deactivate(conn: &Connection, id: &AffiliationId, now: u64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE affiliations
         SET status = ?1, effective_until = COALESCE(MIN(effective_until, ?2), ?2)
         WHERE id = ?3 AND status = ?4",
        rusqlite::params![
            AffiliationStatus::Inactive.as_str(),
            now as i64,
            id.to_string(),
            AffiliationStatus::Active.as_str(),
        ],
    )?;
    Ok(updated == 1)
}
