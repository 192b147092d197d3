//! Split override query functions.

use encore_types::principal::PrincipalKind;
use encore_types::split::SplitOverride;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{columns, constraint, Result};

const OVERRIDE_COLUMNS: &str = "id, subject_id, subject_kind, artist_percentage, label_percentage,
     is_active, effective_from, effective_until";

fn map_override(row: &Row<'_>) -> rusqlite::Result<SplitOverride> {
    Ok(SplitOverride {
        id: columns::uuid(row, 0)?,
        subject_id: row.get(1)?,
        subject_kind: columns::tag(row, 2)?,
        artist_percentage: columns::decimal(row, 3)?,
        label_percentage: columns::decimal(row, 4)?,
        is_active: row.get(5)?,
        effective_from: columns::timestamp(row, 6)?,
        effective_until: columns::opt_timestamp(row, 7)?,
    })
}

/// Insert an override. At most one active override may exist per subject.
pub fn insert(conn: &Connection, split: &SplitOverride, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO split_overrides
         (id, subject_id, subject_kind, artist_percentage, label_percentage,
          is_active, effective_from, effective_until, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            split.id.to_string(),
            split.subject_id,
            split.subject_kind.as_str(),
            split.artist_percentage.to_string(),
            split.label_percentage.to_string(),
            split.is_active,
            split.effective_from as i64,
            split.effective_until.map(|t| t as i64),
            created_at as i64,
        ],
    )
    .map_err(|e| constraint(e, "split override"))?;
    Ok(())
}

/// The subject's override in force at `now`.
pub fn active_for_subject(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
    now: u64,
) -> Result<Option<SplitOverride>> {
    let split = conn
        .query_row(
            &format!(
                "SELECT {OVERRIDE_COLUMNS} FROM split_overrides
                 WHERE subject_id = ?1 AND subject_kind = ?2 AND is_active = 1
                   AND effective_from <= ?3
                   AND (effective_until IS NULL OR effective_until > ?3)"
            ),
            rusqlite::params![subject_id, subject_kind.as_str(), now as i64],
            map_override,
        )
        .optional()?;
    Ok(split)
}

/// Soft-disable the subject's active override, closing its window at `now`.
///
/// Returns the number of rows deactivated (0 or 1).
pub fn deactivate_active(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
    now: u64,
) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE split_overrides
         SET is_active = 0, effective_until = COALESCE(MIN(effective_until, ?1), ?1)
         WHERE subject_id = ?2 AND subject_kind = ?3 AND is_active = 1",
        rusqlite::params![now as i64, subject_id, subject_kind.as_str()],
    )?;
    Ok(updated)
}

/// Every override in force at `now`, artists first.
pub fn list_active(conn: &Connection, now: u64) -> Result<Vec<SplitOverride>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OVERRIDE_COLUMNS} FROM split_overrides
         WHERE is_active = 1 AND effective_from <= ?1
           AND (effective_until IS NULL OR effective_until > ?1)
         ORDER BY subject_kind, subject_id"
    ))?;

    let rows = stmt
        .query_map([now as i64], map_override)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Full history for one subject, newest first.
pub fn history(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
) -> Result<Vec<SplitOverride>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OVERRIDE_COLUMNS} FROM split_overrides
         WHERE subject_id = ?1 AND subject_kind = ?2
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![subject_id, subject_kind.as_str()], map_override)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;
    use rust_decimal_macros::dec;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn artist_override(subject: &str, artist_pct: rust_decimal::Decimal) -> SplitOverride {
        SplitOverride {
            id: uuid::Uuid::new_v4(),
            subject_id: subject.to_string(),
            subject_kind: PrincipalKind::Artist,
            artist_percentage: artist_pct,
            label_percentage: dec!(100) - artist_pct,
            is_active: true,
            effective_from: 100,
            effective_until: None,
        }
    }

    #[test]
    fn test_insert_and_active() {
        let conn = test_db();
        let o = artist_override("artist-1", dec!(70));
        insert(&conn, &o, 100).expect("insert");

        let active = active_for_subject(&conn, "artist-1", PrincipalKind::Artist, 150)
            .expect("query")
            .expect("some");
        assert_eq!(active, o);
        assert!(active_for_subject(&conn, "artist-1", PrincipalKind::LabelAdmin, 150)
            .expect("query")
            .is_none());
    }

    #[test]
    fn test_single_active_per_subject() {
        let conn = test_db();
        insert(&conn, &artist_override("artist-1", dec!(70)), 100).expect("insert");
        let second = insert(&conn, &artist_override("artist-1", dec!(60)), 110);
        assert!(matches!(second, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_deactivate_keeps_history() {
        let conn = test_db();
        insert(&conn, &artist_override("artist-1", dec!(70)), 100).expect("insert");
        assert_eq!(
            deactivate_active(&conn, "artist-1", PrincipalKind::Artist, 200).expect("deactivate"),
            1
        );
        assert_eq!(
            deactivate_active(&conn, "artist-1", PrincipalKind::Artist, 300).expect("deactivate"),
            0
        );
        assert!(active_for_subject(&conn, "artist-1", PrincipalKind::Artist, 250)
            .expect("query")
            .is_none());

        let past = history(&conn, "artist-1", PrincipalKind::Artist).expect("history");
        assert_eq!(past.len(), 1);
        assert!(!past[0].is_active);
        assert_eq!(past[0].effective_until, Some(200));
    }

    #[test]
    fn test_list_active() {
        let conn = test_db();
        insert(&conn, &artist_override("artist-2", dec!(90)), 100).expect("insert");
        insert(&conn, &artist_override("artist-1", dec!(70)), 100).expect("insert");
        let listed = list_active(&conn, 150).expect("list");
        let subjects: Vec<_> = listed.iter().map(|o| o.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["artist-1", "artist-2"]);
    }
}
