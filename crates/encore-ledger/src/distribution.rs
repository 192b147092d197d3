//! Split distribution engine.
//!
//! Turns a raw earning into ledger entries. For an unaffiliated artist that
//! is a single full-amount entry; for an affiliated artist it is an artist
//! share and a label share, cross-linked, plus a [`SharedEarningsRecord`]
//! tying them to the affiliation.
//!
//! Every distribution carries an idempotency key (e.g. partner report id +
//! row number). The key, the entries and the record are written in one
//! `IMMEDIATE` transaction, so replaying the same key from any connection
//! returns the original outcome and writes nothing.

use std::collections::BTreeMap;

use encore_db::queries::distributions::{self, DistributionRef};
use encore_db::queries::{ledger, shared_earnings};
use encore_revenue::splits::{self, Resolution};
use encore_revenue::RevenueError;
use encore_types::ledger::{EarningType, EntryStatus, LedgerEntry, NewEntry, SourceEvent};
use encore_types::principal::PrincipalKind;
use encore_types::split::{LabelArtistEarnings, SharedEarningsRecord};
use encore_types::EntryId;
use rusqlite::{Connection, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{immediate, registry, store, LedgerError, Result};

/// What a source event turned into.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Distribution {
    /// Divided between artist and label admin.
    Split(SharedEarningsRecord),
    /// Credited in full to an unaffiliated artist.
    Unsplit(LedgerEntry),
}

/// Distribute one source event.
///
/// # Errors
///
/// - [`LedgerError::Validation`] for an empty key or principal, a
///   non-positive amount, or a bad currency
/// - [`LedgerError::InconsistentSplitConfig`] if the configuration in force
///   is corrupt; nothing is written
pub fn distribute(
    conn: &mut Connection,
    event: &SourceEvent,
    idempotency_key: &str,
    now: u64,
) -> Result<Distribution> {
    if idempotency_key.trim().is_empty() {
        return Err(LedgerError::Validation("idempotency key is required".into()));
    }

    let tx = immediate(conn)?;

    if let Some(previous) = distributions::get(&tx, idempotency_key)? {
        tracing::debug!(key = idempotency_key, "distribution replayed");
        return load(&tx, previous);
    }

    if event.amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "earning amount must be positive, got {}",
            event.amount
        )));
    }
    store::validate(&full_credit(event))?;

    let ctx = registry::split_context(&tx, &event.principal_id, now)?;
    let resolution = splits::resolve(&ctx).map_err(|e| {
        if let RevenueError::InconsistentSplitConfig { origin, .. } = &e {
            tracing::error!(
                artist = %event.principal_id,
                key = idempotency_key,
                origin = *origin,
                error = %e,
                "refusing to distribute under inconsistent split config"
            );
        }
        LedgerError::from(e)
    })?;

    let outcome = match ctx.affiliation.as_ref().filter(|_| resolution.is_split()) {
        None => {
            let entry = store::write(&tx, uuid::Uuid::new_v4(), full_credit(event), now)?;
            distributions::insert(&tx, idempotency_key, DistributionRef::Entry(entry.id), now)?;

            tracing::info!(
                artist = %entry.principal_id,
                entry = %entry.id,
                amount = %entry.amount,
                currency = %entry.currency,
                key = idempotency_key,
                "earning credited without split"
            );
            Distribution::Unsplit(entry)
        }
        Some(affiliation) => {
            let record = write_split(
                &tx,
                event,
                &affiliation.label_admin_id,
                affiliation.id,
                &resolution,
                idempotency_key,
                now,
            )?;
            distributions::insert(&tx, idempotency_key, DistributionRef::Shared(record.id), now)?;

            tracing::info!(
                artist = %event.principal_id,
                label = %affiliation.label_admin_id,
                source = resolution.source.as_str(),
                artist_pct = %resolution.percentages.artist_pct,
                artist_amount = %record.artist_amount,
                label_amount = %record.label_amount,
                currency = %record.currency,
                key = idempotency_key,
                "earning split"
            );
            Distribution::Split(record)
        }
    };

    tx.commit()?;
    Ok(outcome)
}

fn full_credit(event: &SourceEvent) -> NewEntry {
    NewEntry {
        principal_id: event.principal_id.clone(),
        principal_kind: PrincipalKind::Artist,
        amount: event.amount,
        currency: event.currency.clone(),
        earning_type: event.earning_type,
        status: EntryStatus::Pending,
        platform: event.platform.clone(),
        territory: event.territory.clone(),
        linked_entry_id: None,
        notes: event.notes.clone(),
    }
}

fn write_split(
    tx: &Transaction<'_>,
    event: &SourceEvent,
    label_admin_id: &str,
    affiliation_id: uuid::Uuid,
    resolution: &Resolution,
    key: &str,
    now: u64,
) -> Result<SharedEarningsRecord> {
    let (artist_amount, label_amount) = splits::split_amount(event.amount, &resolution.percentages)?;

    // Ids are fixed up front so each share can point at its sibling.
    let artist_id = (!artist_amount.is_zero()).then(uuid::Uuid::new_v4);
    let label_id = (!label_amount.is_zero()).then(uuid::Uuid::new_v4);

    let share = |principal_id: &str,
                 kind: PrincipalKind,
                 amount: Decimal,
                 sibling: Option<EntryId>| NewEntry {
        principal_id: principal_id.to_string(),
        principal_kind: kind,
        amount,
        currency: event.currency.clone(),
        earning_type: EarningType::SplitShare,
        status: EntryStatus::Pending,
        platform: event.platform.clone(),
        territory: event.territory.clone(),
        linked_entry_id: sibling,
        notes: event.notes.clone(),
    };

    if let Some(id) = artist_id {
        store::write(
            tx,
            id,
            share(&event.principal_id, PrincipalKind::Artist, artist_amount, label_id),
            now,
        )?;
    }
    if let Some(id) = label_id {
        store::write(
            tx,
            id,
            share(label_admin_id, PrincipalKind::LabelAdmin, label_amount, artist_id),
            now,
        )?;
    }

    let record = SharedEarningsRecord {
        id: uuid::Uuid::new_v4(),
        affiliation_id,
        source_entry_id: key.to_string(),
        artist_entry_id: artist_id,
        label_entry_id: label_id,
        artist_amount,
        label_amount,
        total_amount: event.amount,
        currency: event.currency.clone(),
        created_at: now,
    };
    shared_earnings::insert(tx, &record)?;

    Ok(record)
}

fn load(conn: &Connection, previous: DistributionRef) -> Result<Distribution> {
    match previous {
        DistributionRef::Shared(id) => shared_earnings::get(conn, &id)?
            .map(Distribution::Split)
            .ok_or_else(|| LedgerError::NotFound(format!("shared earnings {id}"))),
        DistributionRef::Entry(id) => ledger::get(conn, &id)?
            .map(Distribution::Unsplit)
            .ok_or_else(|| LedgerError::NotFound(format!("ledger entry {id}"))),
    }
}

/// Every split credited to a label admin, newest first.
pub fn list_shared_earnings(conn: &Connection, label_admin_id: &str) -> Result<Vec<SharedEarningsRecord>> {
    Ok(shared_earnings::for_label(conn, label_admin_id)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// A label admin's shared earnings totalled per artist and currency.
pub fn label_earnings_summary(
    conn: &Connection,
    label_admin_id: &str,
) -> Result<Vec<LabelArtistEarnings>> {
    let mut totals: BTreeMap<(String, String), LabelArtistEarnings> = BTreeMap::new();

    for (artist_id, record) in shared_earnings::for_label(conn, label_admin_id)? {
        let row = totals
            .entry((artist_id.clone(), record.currency.clone()))
            .or_insert_with(|| LabelArtistEarnings {
                artist_id,
                currency: record.currency.clone(),
                total_amount: Decimal::ZERO,
                artist_share: Decimal::ZERO,
                label_share: Decimal::ZERO,
                record_count: 0,
            });
        row.total_amount += record.total_amount;
        row.artist_share += record.artist_amount;
        row.label_share += record.label_amount;
        row.record_count += 1;
    }

    Ok(totals.into_values().collect())
}
