//! Shared earnings (split result) query functions.

use encore_types::split::SharedEarningsRecord;
use encore_types::{PrincipalId, SharedEarningsId};
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{columns, constraint, Result};

const RECORD_COLUMNS: &str = "s.id, s.affiliation_id, s.source_entry_id, s.artist_entry_id,
     s.label_entry_id, s.artist_amount, s.label_amount, s.total_amount, s.currency, s.created_at";

fn map_record(row: &Row<'_>) -> rusqlite::Result<SharedEarningsRecord> {
    Ok(SharedEarningsRecord {
        id: columns::uuid(row, 0)?,
        affiliation_id: columns::uuid(row, 1)?,
        source_entry_id: row.get(2)?,
        artist_entry_id: columns::opt_uuid(row, 3)?,
        label_entry_id: columns::opt_uuid(row, 4)?,
        artist_amount: columns::decimal(row, 5)?,
        label_amount: columns::decimal(row, 6)?,
        total_amount: columns::decimal(row, 7)?,
        currency: row.get(8)?,
        created_at: columns::timestamp(row, 9)?,
    })
}

/// Insert a split result. `source_entry_id` is unique.
pub fn insert(conn: &Connection, record: &SharedEarningsRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO shared_earnings
         (id, affiliation_id, source_entry_id, artist_entry_id, label_entry_id,
          artist_amount, label_amount, total_amount, currency, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            record.id.to_string(),
            record.affiliation_id.to_string(),
            record.source_entry_id,
            record.artist_entry_id.map(|id| id.to_string()),
            record.label_entry_id.map(|id| id.to_string()),
            record.artist_amount.to_string(),
            record.label_amount.to_string(),
            record.total_amount.to_string(),
            record.currency,
            record.created_at as i64,
        ],
    )
    .map_err(|e| constraint(e, "shared earnings"))?;
    Ok(())
}

/// Fetch one record.
pub fn get(conn: &Connection, id: &SharedEarningsId) -> Result<Option<SharedEarningsRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM shared_earnings s WHERE s.id = ?1"),
            [id.to_string()],
            map_record,
        )
        .optional()?;
    Ok(record)
}

/// Every split credited to a label admin, with the artist it came from,
/// newest first.
pub fn for_label(
    conn: &Connection,
    label_admin_id: &str,
) -> Result<Vec<(PrincipalId, SharedEarningsRecord)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}, a.artist_id
         FROM shared_earnings s
         JOIN affiliations a ON a.id = s.affiliation_id
         WHERE a.label_admin_id = ?1
         ORDER BY s.created_at DESC, s.rowid DESC"
    ))?;

    let rows = stmt
        .query_map([label_admin_id], |row| Ok((row.get(10)?, map_record(row)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Total number of split records.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM shared_earnings", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{affiliations, ledger};
    use crate::DbError;
    use encore_types::ledger::{EarningType, EntryStatus, LedgerEntry};
    use encore_types::principal::PrincipalKind;
    use encore_types::split::{Affiliation, AffiliationStatus};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn share(conn: &Connection, principal: &str, kind: PrincipalKind, amount: Decimal) -> uuid::Uuid {
        let entry = LedgerEntry {
            id: uuid::Uuid::new_v4(),
            principal_id: principal.to_string(),
            principal_kind: kind,
            amount,
            currency: "GBP".to_string(),
            earning_type: EarningType::SplitShare,
            status: EntryStatus::Pending,
            platform: Some("spotify".to_string()),
            territory: None,
            linked_entry_id: None,
            created_at: 100,
            notes: None,
        };
        ledger::insert(conn, &entry).expect("insert entry");
        entry.id
    }

    fn affiliation(conn: &Connection) -> uuid::Uuid {
        let affiliation = Affiliation {
            id: uuid::Uuid::new_v4(),
            label_admin_id: "label-1".to_string(),
            artist_id: "artist-1".to_string(),
            label_percentage: Some(dec!(20)),
            status: AffiliationStatus::Active,
            effective_from: 0,
            effective_until: None,
        };
        affiliations::insert(conn, &affiliation, 0).expect("insert affiliation");
        affiliation.id
    }

    fn record(conn: &Connection, affiliation_id: uuid::Uuid, key: &str) -> SharedEarningsRecord {
        SharedEarningsRecord {
            id: uuid::Uuid::new_v4(),
            affiliation_id,
            source_entry_id: key.to_string(),
            artist_entry_id: Some(share(conn, "artist-1", PrincipalKind::Artist, dec!(80.00))),
            label_entry_id: Some(share(conn, "label-1", PrincipalKind::LabelAdmin, dec!(20.00))),
            artist_amount: dec!(80.00),
            label_amount: dec!(20.00),
            total_amount: dec!(100.00),
            currency: "GBP".to_string(),
            created_at: 100,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = test_db();
        let aff = affiliation(&conn);
        let rec = record(&conn, aff, "report-1:1");
        insert(&conn, &rec).expect("insert");
        assert_eq!(get(&conn, &rec.id).expect("get"), Some(rec));
        assert_eq!(count(&conn).expect("count"), 1);
    }

    #[test]
    fn test_source_entry_unique() {
        let conn = test_db();
        let aff = affiliation(&conn);
        insert(&conn, &record(&conn, aff, "report-1:1")).expect("insert");

        let second = record(&conn, aff, "report-1:1");
        assert!(matches!(insert(&conn, &second), Err(DbError::Constraint(_))));
        assert_eq!(count(&conn).expect("count"), 1);
    }

    #[test]
    fn test_for_label_joins_artist() {
        let conn = test_db();
        let aff = affiliation(&conn);
        insert(&conn, &record(&conn, aff, "report-1:1")).expect("insert");
        insert(&conn, &record(&conn, aff, "report-1:2")).expect("insert");

        let rows = for_label(&conn, "label-1").expect("query");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(artist, _)| artist == "artist-1"));
        assert!(for_label(&conn, "label-2").expect("query").is_empty());
    }
}
