//! Integration test crate for the Encore ledger.
//!
//! The scenarios under `tests/` exercise flows that cross the registry,
//! distribution engine, wallet and payout workflow, against real database
//! files so that several connections can contend for the write lock.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p encore-integration-tests
//! ```

use std::path::PathBuf;
use std::time::Duration;

use encore_types::ledger::{EarningType, EntryStatus, NewEntry, SourceEvent};
use encore_types::principal::PrincipalKind;
use encore_types::EntryId;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Simulated timestamp for deterministic testing.
pub const BASE_TIME: u64 = 1_700_000_000;

/// A migrated ledger database in a temporary directory.
///
/// The directory, and the database with it, is removed on drop.
pub struct TestLedger {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl TestLedger {
    /// Create and migrate a fresh database file.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("encore.db");
        encore_db::open(&path).expect("migrate test db");
        Self { _dir: dir, path }
    }

    /// Another connection to the same file, as a separate worker would hold.
    pub fn connect(&self) -> Connection {
        encore_db::connect(&self.path, Duration::from_secs(10)).expect("connect test db")
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Credit `amount` as already-paid GBP so it counts towards `available`.
pub fn fund(conn: &Connection, principal_id: &str, amount: Decimal) -> EntryId {
    encore_ledger::store::append(
        conn,
        NewEntry {
            principal_id: principal_id.into(),
            principal_kind: PrincipalKind::Artist,
            amount,
            currency: "GBP".into(),
            earning_type: EarningType::ManualAdjustment,
            status: EntryStatus::Paid,
            platform: None,
            territory: None,
            linked_entry_id: None,
            notes: Some("test funding".into()),
        },
        BASE_TIME,
    )
    .expect("fund principal")
}

/// A GBP streaming royalty reported for `artist_id`.
pub fn stream_royalty(artist_id: &str, amount: Decimal) -> SourceEvent {
    SourceEvent {
        principal_id: artist_id.into(),
        amount,
        currency: "GBP".into(),
        platform: Some("spotify".into()),
        earning_type: EarningType::StreamRoyalty,
        territory: Some("GB".into()),
        notes: None,
    }
}

/// Bank details accepted by the payout workflow.
pub fn bank_details() -> serde_json::Value {
    serde_json::json!({
        "account_name": "Test Artist",
        "sort_code": "00-00-00",
        "account_number": "12345678",
    })
}
