//! Integration test: Revenue split resolution through the distribution engine.
//!
//! Exercises the complete split lifecycle:
//! 1. Unaffiliated artists keep the whole earning
//! 2. Affiliation percentage splits and cross-linked sibling entries
//! 3. Override precedence (artist over label over affiliation over default)
//! 4. Deactivating overrides and ending affiliations
//! 5. Rounding: every split sums exactly to its total
//! 6. Idempotent replays across connections, sequential and concurrent
//!
//! Uses encore-ledger (registry, distribution, wallet, store) against a
//! file-backed database.

use std::sync::{Arc, Barrier};
use std::thread;

use encore_integration_tests::{stream_royalty, TestLedger, BASE_TIME};
use encore_ledger::distribution::{self, Distribution};
use encore_ledger::{registry, store, wallet, LedgerError};
use encore_types::ledger::{EarningType, EntryStatus};
use encore_types::principal::PrincipalKind;
use encore_types::split::SharedEarningsRecord;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn expect_split(outcome: Distribution) -> SharedEarningsRecord {
    let Distribution::Split(record) = outcome else {
        unreachable!("expected a split, got {outcome:?}");
    };
    record
}

#[test]
fn unaffiliated_artist_keeps_everything() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();

    let outcome = distribution::distribute(
        &mut conn,
        &stream_royalty("solo-artist", dec!(100.00)),
        "report-1:1",
        BASE_TIME,
    )
    .expect("distribute");

    let Distribution::Unsplit(entry) = outcome else {
        unreachable!("unaffiliated artist must not be split");
    };
    assert_eq!(entry.amount, dec!(100.00));
    assert_eq!(entry.status, EntryStatus::Pending);
    assert_eq!(entry.earning_type, EarningType::StreamRoyalty);

    let entries = store::query_by_principal(&conn, "solo-artist", None).expect("entries");
    assert_eq!(entries.len(), 1);
    assert!(distribution::list_shared_earnings(&conn, "any-label")
        .expect("records")
        .is_empty());
}

#[test]
fn affiliation_split_writes_linked_siblings() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", Some(dec!(20)), BASE_TIME)
        .expect("affiliate");

    let record = expect_split(
        distribution::distribute(
            &mut conn,
            &stream_royalty("artist-1", dec!(100.00)),
            "report-1:1",
            BASE_TIME + 10,
        )
        .expect("distribute"),
    );
    assert_eq!(record.artist_amount, dec!(80.00));
    assert_eq!(record.label_amount, dec!(20.00));
    assert_eq!(record.source_entry_id, "report-1:1");

    let artist_id = record.artist_entry_id.expect("artist entry");
    let label_id = record.label_entry_id.expect("label entry");
    let artist_entry = store::get(&conn, &artist_id).expect("artist entry");
    let label_entry = store::get(&conn, &label_id).expect("label entry");

    assert_eq!(artist_entry.principal_kind, PrincipalKind::Artist);
    assert_eq!(label_entry.principal_kind, PrincipalKind::LabelAdmin);
    assert_eq!(artist_entry.earning_type, EarningType::SplitShare);
    assert_eq!(label_entry.status, EntryStatus::Pending);
    assert_eq!(artist_entry.linked_entry_id, Some(label_id));
    assert_eq!(label_entry.linked_entry_id, Some(artist_id));

    let label_balance = wallet::balance(&conn, "label-1", "GBP").expect("balance");
    assert_eq!(label_balance.pending, dec!(20.00));
    assert_eq!(label_balance.available, Decimal::ZERO);
}

#[test]
fn override_precedence_end_to_end() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", Some(dec!(25)), BASE_TIME)
        .expect("affiliate");

    let mut tick = BASE_TIME;
    let mut artist_share = |conn: &mut rusqlite::Connection, key: &str| {
        tick += 10;
        expect_split(
            distribution::distribute(conn, &stream_royalty("artist-1", dec!(100.00)), key, tick)
                .expect("distribute"),
        )
        .artist_amount
    };

    // Affiliation percentage.
    assert_eq!(artist_share(&mut conn, "k1"), dec!(75.00));

    // Label override beats the affiliation.
    registry::set_override(&mut conn, "label-1", PrincipalKind::LabelAdmin, dec!(40), BASE_TIME + 15)
        .expect("label override");
    assert_eq!(artist_share(&mut conn, "k2"), dec!(60.00));

    // Artist override beats the label override.
    registry::set_override(&mut conn, "artist-1", PrincipalKind::Artist, dec!(90), BASE_TIME + 25)
        .expect("artist override");
    assert_eq!(artist_share(&mut conn, "k3"), dec!(90.00));

    // Dropping the artist override falls back to the label override.
    registry::deactivate_override(&conn, "artist-1", PrincipalKind::Artist, BASE_TIME + 35)
        .expect("deactivate");
    assert_eq!(artist_share(&mut conn, "k4"), dec!(60.00));

    // Ending the affiliation means no split at all, overrides notwithstanding.
    let affiliation = registry::get_active_affiliation(&conn, "artist-1", BASE_TIME + 45)
        .expect("lookup")
        .expect("active affiliation");
    registry::end_affiliation(&conn, &affiliation.id, BASE_TIME + 45).expect("end");

    let outcome = distribution::distribute(
        &mut conn,
        &stream_royalty("artist-1", dec!(100.00)),
        "k5",
        BASE_TIME + 55,
    )
    .expect("distribute");
    assert!(matches!(outcome, Distribution::Unsplit(ref e) if e.amount == dec!(100.00)));
}

#[test]
fn platform_default_applies_without_affiliation_percentage() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", None, BASE_TIME)
        .expect("affiliate");

    let record = expect_split(
        distribution::distribute(&mut conn, &stream_royalty("artist-1", dec!(50.00)), "a", BASE_TIME + 1)
            .expect("distribute"),
    );
    assert_eq!(record.artist_amount, dec!(40.00));
    assert_eq!(record.label_amount, dec!(10.00));

    registry::set_platform_default_split(&mut conn, dec!(65)).expect("set default");
    let record = expect_split(
        distribution::distribute(&mut conn, &stream_royalty("artist-1", dec!(50.00)), "b", BASE_TIME + 2)
            .expect("distribute"),
    );
    assert_eq!(record.artist_amount, dec!(32.50));
    assert_eq!(record.label_amount, dec!(17.50));
}

#[test]
fn rounding_never_loses_a_cent() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", Some(dec!(33.33)), BASE_TIME)
        .expect("affiliate");

    let amounts = [dec!(0.01), dec!(0.03), dec!(1.00), dec!(9.99), dec!(33.33), dec!(1234.57)];
    let mut total = Decimal::ZERO;
    for (i, amount) in amounts.iter().enumerate() {
        let record = expect_split(
            distribution::distribute(
                &mut conn,
                &stream_royalty("artist-1", *amount),
                &format!("rounding:{i}"),
                BASE_TIME + 1,
            )
            .expect("distribute"),
        );
        assert_eq!(record.artist_amount + record.label_amount, *amount);
        assert!(record.artist_amount >= Decimal::ZERO);
        assert!(record.label_amount >= Decimal::ZERO);
        total += *amount;
    }

    let artist = wallet::balance(&conn, "artist-1", "GBP").expect("artist");
    let label = wallet::balance(&conn, "label-1", "GBP").expect("label");
    assert_eq!(artist.pending + label.pending, total);
}

#[test]
fn replay_on_another_connection_returns_original() {
    let ledger = TestLedger::new();
    let mut first = ledger.connect();
    let mut second = ledger.connect();
    registry::create_affiliation(&mut first, "label-1", "artist-1", Some(dec!(20)), BASE_TIME)
        .expect("affiliate");

    let event = stream_royalty("artist-1", dec!(100.00));
    let original = distribution::distribute(&mut first, &event, "report-7:3", BASE_TIME + 1)
        .expect("first");
    let replay = distribution::distribute(&mut second, &event, "report-7:3", BASE_TIME + 99)
        .expect("replay");
    assert_eq!(original, replay);

    assert_eq!(
        distribution::list_shared_earnings(&first, "label-1").expect("records").len(),
        1
    );
    assert_eq!(
        store::query_by_principal(&first, "artist-1", None).expect("entries").len(),
        1
    );
}

#[test]
fn concurrent_replays_split_once() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", Some(dec!(20)), BASE_TIME)
        .expect("affiliate");

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let barrier = barrier.clone();
            let mut conn = ledger.connect();
            thread::spawn(move || {
                barrier.wait();
                distribution::distribute(
                    &mut conn,
                    &stream_royalty("artist-1", dec!(100.00)),
                    "report-9:1",
                    BASE_TIME + 1,
                )
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("worker thread").expect("distribute"))
        .collect();

    // Every caller sees the one record that was written.
    assert!(outcomes.iter().all(|o| *o == outcomes[0]));
    let record = expect_split(outcomes[0].clone());
    assert_eq!(record.artist_amount, dec!(80.00));

    assert_eq!(
        distribution::list_shared_earnings(&conn, "label-1").expect("records").len(),
        1
    );
    assert_eq!(
        store::query_by_principal(&conn, "artist-1", None).expect("entries").len(),
        1
    );
    assert_eq!(
        store::query_by_principal(&conn, "label-1", None).expect("entries").len(),
        1
    );
    let artist = wallet::balance(&conn, "artist-1", "GBP").expect("balance");
    assert_eq!(artist.pending, dec!(80.00));
}

#[test]
fn corrupt_override_halts_distribution() {
    let ledger = TestLedger::new();
    let mut conn = ledger.connect();
    registry::create_affiliation(&mut conn, "label-1", "artist-1", Some(dec!(20)), BASE_TIME)
        .expect("affiliate");
    registry::set_override(&mut conn, "artist-1", PrincipalKind::Artist, dec!(70), BASE_TIME)
        .expect("override");

    // A hand edit that breaks the 100 % invariant.
    conn.execute(
        "UPDATE split_overrides SET label_percentage = '40' WHERE subject_id = 'artist-1'",
        [],
    )
    .expect("corrupt");

    let result = distribution::distribute(
        &mut conn,
        &stream_royalty("artist-1", dec!(100.00)),
        "bad",
        BASE_TIME + 1,
    );
    assert!(matches!(result, Err(LedgerError::InconsistentSplitConfig(_))));
    assert!(store::query_by_principal(&conn, "artist-1", None)
        .expect("entries")
        .is_empty());
}
