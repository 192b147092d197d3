//! Append-and-transition ledger store.
//!
//! Entries are never updated in place except for their status, and never
//! deleted. Status moves are compare-and-swap: the update only applies if
//! the row is still in the status the caller observed.

use encore_db::queries::ledger;
use encore_types::ledger::{EntryStatus, LedgerEntry, NewEntry};
use encore_types::{is_currency_code, EntryId, AMOUNT_SCALE};
use rusqlite::Connection;

use crate::{LedgerError, Result};

/// Reject entries that can never be valid ledger rows.
pub fn validate(entry: &NewEntry) -> Result<()> {
    if entry.principal_id.trim().is_empty() {
        return Err(LedgerError::Validation("principal id is empty".into()));
    }
    if entry.amount.is_zero() {
        return Err(LedgerError::Validation("amount is zero".into()));
    }
    if entry.amount.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::Validation(format!(
            "amount {} has more than {AMOUNT_SCALE} decimal places",
            entry.amount
        )));
    }
    if !is_currency_code(&entry.currency) {
        return Err(LedgerError::Validation(format!(
            "invalid currency code {:?}",
            entry.currency
        )));
    }
    Ok(())
}

/// Write one entry under a caller-chosen id and hand back the stored row.
/// Split siblings need each other's ids before either is written.
pub(crate) fn write(conn: &Connection, id: EntryId, entry: NewEntry, now: u64) -> Result<LedgerEntry> {
    validate(&entry)?;

    let stored = LedgerEntry {
        id,
        principal_id: entry.principal_id,
        principal_kind: entry.principal_kind,
        amount: entry.amount,
        currency: entry.currency,
        earning_type: entry.earning_type,
        status: entry.status,
        platform: entry.platform,
        territory: entry.territory,
        linked_entry_id: entry.linked_entry_id,
        created_at: now,
        notes: entry.notes,
    };
    ledger::insert(conn, &stored)?;

    tracing::debug!(
        entry = %stored.id,
        principal = %stored.principal_id,
        amount = %stored.amount,
        currency = %stored.currency,
        earning_type = %stored.earning_type,
        status = %stored.status,
        "ledger entry appended"
    );

    Ok(stored)
}

/// Append a new entry.
///
/// # Errors
///
/// - [`LedgerError::Validation`] if the principal id is empty, the amount is
///   zero or finer than minor units, or the currency is not an ISO-4217 code
pub fn append(conn: &Connection, entry: NewEntry, now: u64) -> Result<EntryId> {
    Ok(write(conn, uuid::Uuid::new_v4(), entry, now)?.id)
}

/// Move an entry from `from` to `to`.
///
/// # Errors
///
/// - [`LedgerError::InvalidTransition`] if `from -> to` is not an edge of the
///   status machine, or the entry is no longer in `from` (the error then
///   carries the status actually found)
/// - [`LedgerError::NotFound`] if the entry does not exist
pub fn transition(conn: &Connection, id: &EntryId, from: EntryStatus, to: EntryStatus) -> Result<()> {
    if !from.can_transition_to(to) {
        return Err(LedgerError::entry_transition(id, from, to));
    }

    if ledger::compare_and_set_status(conn, id, from, to)? {
        tracing::info!(entry = %id, %from, %to, "ledger entry transitioned");
        return Ok(());
    }

    match ledger::status_of(conn, id)? {
        None => Err(LedgerError::NotFound(format!("ledger entry {id}"))),
        Some(actual) => {
            tracing::warn!(entry = %id, expected = %from, %actual, %to, "stale ledger transition");
            Err(LedgerError::entry_transition(id, actual, to))
        }
    }
}

/// A principal's entries in creation order, optionally filtered by status.
pub fn query_by_principal(
    conn: &Connection,
    principal_id: &str,
    status: Option<EntryStatus>,
) -> Result<Vec<LedgerEntry>> {
    Ok(ledger::by_principal(conn, principal_id, status)?)
}

/// Fetch one entry.
pub fn get(conn: &Connection, id: &EntryId) -> Result<LedgerEntry> {
    ledger::get(conn, id)?.ok_or_else(|| LedgerError::NotFound(format!("ledger entry {id}")))
}

/// Entries back-referencing `linked_id` (a split sibling or a payout request).
pub fn query_linked(conn: &Connection, linked_id: &uuid::Uuid) -> Result<Vec<LedgerEntry>> {
    Ok(ledger::by_linked(conn, linked_id)?)
}
