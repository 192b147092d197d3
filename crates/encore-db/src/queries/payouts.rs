//! Payout request query functions.

use encore_types::payout::{PayoutRequest, PayoutStatus};
use encore_types::{EntryId, PayoutRequestId};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{columns, constraint, DbError, Result};

const REQUEST_COLUMNS: &str = "id, principal_id, principal_kind, amount, currency, bank_details,
     status, requested_at, processed_at, debit_entry_id, notes";

fn map_request(row: &Row<'_>) -> rusqlite::Result<PayoutRequest> {
    Ok(PayoutRequest {
        id: columns::uuid(row, 0)?,
        principal_id: row.get(1)?,
        principal_kind: columns::tag(row, 2)?,
        amount: columns::decimal(row, 3)?,
        currency: row.get(4)?,
        bank_details: columns::json(row, 5)?,
        status: columns::tag(row, 6)?,
        requested_at: columns::timestamp(row, 7)?,
        processed_at: columns::opt_timestamp(row, 8)?,
        debit_entry_id: columns::opt_uuid(row, 9)?,
        notes: row.get(10)?,
    })
}

/// Insert a new request.
pub fn insert(conn: &Connection, request: &PayoutRequest) -> Result<()> {
    let bank_details = serde_json::to_string(&request.bank_details)
        .map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO payout_requests
         (id, principal_id, principal_kind, amount, currency, bank_details,
          status, requested_at, processed_at, debit_entry_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            request.id.to_string(),
            request.principal_id,
            request.principal_kind.as_str(),
            request.amount.to_string(),
            request.currency,
            bank_details,
            request.status.as_str(),
            request.requested_at as i64,
            request.processed_at.map(|t| t as i64),
            request.debit_entry_id.map(|id| id.to_string()),
            request.notes,
        ],
    )
    .map_err(|e| constraint(e, "payout request"))?;
    Ok(())
}

/// Fetch one request.
pub fn get(conn: &Connection, id: &PayoutRequestId) -> Result<Option<PayoutRequest>> {
    let request = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM payout_requests WHERE id = ?1"),
            [id.to_string()],
            map_request,
        )
        .optional()?;
    Ok(request)
}

/// `pending -> approved`, attaching the debit entry. Returns `false` if the
/// request was no longer pending.
pub fn mark_approved(
    conn: &Connection,
    id: &PayoutRequestId,
    debit_entry_id: &EntryId,
    now: u64,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE payout_requests
         SET status = ?1, debit_entry_id = ?2, processed_at = ?3
         WHERE id = ?4 AND status = ?5",
        rusqlite::params![
            PayoutStatus::Approved.as_str(),
            debit_entry_id.to_string(),
            now as i64,
            id.to_string(),
            PayoutStatus::Pending.as_str(),
        ],
    )?;
    Ok(updated == 1)
}

/// `pending -> rejected` with a reason. Returns `false` if the request was no
/// longer pending.
pub fn mark_rejected(conn: &Connection, id: &PayoutRequestId, reason: &str, now: u64) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE payout_requests
         SET status = ?1, notes = ?2, processed_at = ?3
         WHERE id = ?4 AND status = ?5",
        rusqlite::params![
            PayoutStatus::Rejected.as_str(),
            reason,
            now as i64,
            id.to_string(),
            PayoutStatus::Pending.as_str(),
        ],
    )?;
    Ok(updated == 1)
}

/// A principal's requests, newest first.
pub fn for_principal(conn: &Connection, principal_id: &str) -> Result<Vec<PayoutRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM payout_requests
         WHERE principal_id = ?1
         ORDER BY requested_at DESC, rowid DESC"
    ))?;

    let rows = stmt
        .query_map([principal_id], map_request)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Requests in one status, oldest first (the admin review queue).
pub fn by_status(conn: &Connection, status: PayoutStatus) -> Result<Vec<PayoutRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {REQUEST_COLUMNS} FROM payout_requests
         WHERE status = ?1
         ORDER BY requested_at, rowid"
    ))?;

    let rows = stmt
        .query_map([status.as_str()], map_request)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
