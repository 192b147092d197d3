//! Ledger entry query functions.

use encore_types::ledger::{EntryStatus, LedgerEntry};
use encore_types::EntryId;
use rusqlite::{Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use crate::{columns, constraint, Result};

const ENTRY_COLUMNS: &str = "id, principal_id, principal_kind, amount, currency, earning_type,
     status, platform, territory, linked_entry_id, created_at, notes";

fn map_entry(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        id: columns::uuid(row, 0)?,
        principal_id: row.get(1)?,
        principal_kind: columns::tag(row, 2)?,
        amount: columns::decimal(row, 3)?,
        currency: row.get(4)?,
        earning_type: columns::tag(row, 5)?,
        status: columns::tag(row, 6)?,
        platform: row.get(7)?,
        territory: row.get(8)?,
        linked_entry_id: columns::opt_uuid(row, 9)?,
        created_at: columns::timestamp(row, 10)?,
        notes: row.get(11)?,
    })
}

/// Insert a fully-formed entry.
pub fn insert(conn: &Connection, entry: &LedgerEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO ledger_entries
         (id, principal_id, principal_kind, amount, currency, earning_type,
          status, platform, territory, linked_entry_id, created_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        rusqlite::params![
            entry.id.to_string(),
            entry.principal_id,
            entry.principal_kind.as_str(),
            entry.amount.to_string(),
            entry.currency,
            entry.earning_type.as_str(),
            entry.status.as_str(),
            entry.platform,
            entry.territory,
            entry.linked_entry_id.map(|id| id.to_string()),
            entry.created_at as i64,
            entry.notes,
        ],
    )
    .map_err(|e| constraint(e, "ledger entry"))?;
    Ok(())
}

/// Fetch one entry.
pub fn get(conn: &Connection, id: &EntryId) -> Result<Option<LedgerEntry>> {
    let entry = conn
        .query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1"),
            [id.to_string()],
            map_entry,
        )
        .optional()?;
    Ok(entry)
}

/// Current status of an entry, if it exists.
pub fn status_of(conn: &Connection, id: &EntryId) -> Result<Option<EntryStatus>> {
    let status = conn
        .query_row(
            "SELECT status FROM ledger_entries WHERE id = ?1",
            [id.to_string()],
            |row| columns::tag(row, 0),
        )
        .optional()?;
    Ok(status)
}

/// Move an entry from `from` to `to` only if it is still in `from`.
///
/// Returns `false` when the row is missing or its status has moved on.
pub fn compare_and_set_status(
    conn: &Connection,
    id: &EntryId,
    from: EntryStatus,
    to: EntryStatus,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE ledger_entries SET status = ?1 WHERE id = ?2 AND status = ?3",
        rusqlite::params![to.as_str(), id.to_string(), from.as_str()],
    )?;
    Ok(updated == 1)
}

/// All entries for a principal, oldest first, optionally filtered by status.
pub fn by_principal(
    conn: &Connection,
    principal_id: &str,
    status: Option<EntryStatus>,
) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE principal_id = ?1 AND (?2 IS NULL OR status = ?2)
         ORDER BY created_at, rowid"
    ))?;

    let rows = stmt
        .query_map(
            rusqlite::params![principal_id, status.map(|s| s.as_str())],
            map_entry,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Entries pointing at `linked_id` through `linked_entry_id`.
pub fn by_linked(conn: &Connection, linked_id: &uuid::Uuid) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM ledger_entries
         WHERE linked_entry_id = ?1
         ORDER BY created_at, rowid"
    ))?;

    let rows = stmt
        .query_map([linked_id.to_string()], map_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// `(amount, status)` of every entry a principal holds in `currency`.
pub fn amounts(
    conn: &Connection,
    principal_id: &str,
    currency: &str,
) -> Result<Vec<(Decimal, EntryStatus)>> {
    let mut stmt = conn.prepare(
        "SELECT amount, status FROM ledger_entries
         WHERE principal_id = ?1 AND currency = ?2",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![principal_id, currency], |row| {
            Ok((columns::decimal(row, 0)?, columns::tag(row, 1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Currencies a principal has entries in, sorted.
pub fn currencies(conn: &Connection, principal_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT currency FROM ledger_entries
         WHERE principal_id = ?1 ORDER BY currency",
    )?;

    let rows = stmt
        .query_map([principal_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_types::ledger::EarningType;
    use encore_types::principal::PrincipalKind;
    use rust_decimal_macros::dec;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn entry(principal: &str, amount: Decimal, status: EntryStatus, at: u64) -> LedgerEntry {
        LedgerEntry {
            id: uuid::Uuid::new_v4(),
            principal_id: principal.to_string(),
            principal_kind: PrincipalKind::Artist,
            amount,
            currency: "GBP".to_string(),
            earning_type: EarningType::StreamRoyalty,
            status,
            platform: Some("spotify".to_string()),
            territory: None,
            linked_entry_id: None,
            created_at: at,
            notes: None,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let e = entry("artist-1", dec!(12.34), EntryStatus::Pending, 100);
        insert(&conn, &e).expect("insert");

        let fetched = get(&conn, &e.id).expect("get").expect("exists");
        assert_eq!(fetched, e);
        assert_eq!(fetched.amount.to_string(), "12.34");
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert!(get(&conn, &uuid::Uuid::new_v4()).expect("get").is_none());
    }

    #[test]
    fn test_compare_and_set() {
        let conn = test_db();
        let e = entry("artist-1", dec!(5), EntryStatus::Pending, 100);
        insert(&conn, &e).expect("insert");

        assert!(compare_and_set_status(&conn, &e.id, EntryStatus::Pending, EntryStatus::Paid)
            .expect("cas"));
        // Second writer still believes the entry is pending.
        assert!(!compare_and_set_status(&conn, &e.id, EntryStatus::Pending, EntryStatus::Cancelled)
            .expect("cas"));
        assert_eq!(
            status_of(&conn, &e.id).expect("status"),
            Some(EntryStatus::Paid)
        );
    }

    #[test]
    fn test_value_columns_immutable() {
        let conn = test_db();
        let e = entry("artist-1", dec!(5), EntryStatus::Pending, 100);
        insert(&conn, &e).expect("insert");

        let result = conn.execute(
            "UPDATE ledger_entries SET amount = '500' WHERE id = ?1",
            [e.id.to_string()],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "DELETE FROM ledger_entries WHERE id = ?1",
            [e.id.to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_by_principal_filter_and_order() {
        let conn = test_db();
        insert(&conn, &entry("artist-1", dec!(1), EntryStatus::Paid, 300)).expect("insert");
        insert(&conn, &entry("artist-1", dec!(2), EntryStatus::Pending, 100)).expect("insert");
        insert(&conn, &entry("artist-1", dec!(3), EntryStatus::Pending, 200)).expect("insert");
        insert(&conn, &entry("artist-2", dec!(4), EntryStatus::Pending, 100)).expect("insert");

        let all = by_principal(&conn, "artist-1", None).expect("list");
        let amounts: Vec<_> = all.iter().map(|e| e.amount).collect();
        assert_eq!(amounts, vec![dec!(2), dec!(3), dec!(1)]);

        let pending = by_principal(&conn, "artist-1", Some(EntryStatus::Pending)).expect("list");
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_amounts_and_currencies() {
        let conn = test_db();
        let mut usd = entry("artist-1", dec!(7), EntryStatus::Paid, 100);
        usd.currency = "USD".to_string();
        insert(&conn, &usd).expect("insert");
        insert(&conn, &entry("artist-1", dec!(3), EntryStatus::Held, 100)).expect("insert");

        assert_eq!(
            currencies(&conn, "artist-1").expect("currencies"),
            vec!["GBP".to_string(), "USD".to_string()]
        );
        assert_eq!(
            amounts(&conn, "artist-1", "GBP").expect("amounts"),
            vec![(dec!(3), EntryStatus::Held)]
        );
    }
}
