//! Settings query functions.

use std::str::FromStr;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{DbError, Result};

/// Platform default artist share.
pub const PLATFORM_ARTIST_PCT: &str = "platform_artist_pct";
/// Platform default label share.
pub const PLATFORM_LABEL_PCT: &str = "platform_label_pct";

/// Get a setting value by key.
pub fn get(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("setting '{key}'"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Set a setting value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Get a setting as a decimal, defaulting to `default` if not found.
pub fn get_decimal(conn: &Connection, key: &str, default: Decimal) -> Result<Decimal> {
    match get(conn, key) {
        Ok(v) => Decimal::from_str(&v)
            .map_err(|e| DbError::Serialization(format!("setting '{key}': {e}"))),
        Err(DbError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_default_platform_split() {
        let conn = test_db();
        assert_eq!(get(&conn, PLATFORM_ARTIST_PCT).expect("get"), "80");
        assert_eq!(
            get_decimal(&conn, PLATFORM_LABEL_PCT, Decimal::ZERO).expect("get"),
            dec!(20)
        );
    }

    #[test]
    fn test_set_and_get() {
        let conn = test_db();
        set(&conn, PLATFORM_LABEL_PCT, "25.5").expect("set");
        assert_eq!(
            get_decimal(&conn, PLATFORM_LABEL_PCT, Decimal::ZERO).expect("get"),
            dec!(25.5)
        );
    }

    #[test]
    fn test_get_nonexistent() {
        let conn = test_db();
        let result = get(&conn, "nonexistent");
        assert!(matches!(result, Err(DbError::NotFound(_))));
        assert_eq!(
            get_decimal(&conn, "nonexistent", dec!(7)).expect("default"),
            dec!(7)
        );
    }

    #[test]
    fn test_bad_decimal() {
        let conn = test_db();
        set(&conn, PLATFORM_LABEL_PCT, "twenty").expect("set");
        assert!(matches!(
            get_decimal(&conn, PLATFORM_LABEL_PCT, Decimal::ZERO),
            Err(DbError::Serialization(_))
        ));
    }
}
