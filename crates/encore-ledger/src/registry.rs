//! Affiliation and split-override registry.
//!
//! The registry owns all split configuration: label/artist affiliations,
//! per-principal overrides and the platform default. Nothing is ever
//! deleted; ending an affiliation or replacing an override closes the old
//! row's effective window so history stays auditable.

use encore_db::queries::{affiliations, overrides, settings};
use encore_revenue::splits::{validate_percentage, validate_split, SplitContext};
use encore_types::principal::PrincipalKind;
use encore_types::split::{Affiliation, AffiliationStatus, SplitOverride, SplitPercentages};
use encore_types::{AffiliationId, DEFAULT_ARTIST_PCT, DEFAULT_LABEL_PCT};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{immediate, LedgerError, Result};

// ---------------------------------------------------------------------------
// Affiliations
// ---------------------------------------------------------------------------

/// The artist's affiliation in force at `now`, if any.
pub fn get_active_affiliation(
    conn: &Connection,
    artist_id: &str,
    now: u64,
) -> Result<Option<Affiliation>> {
    Ok(affiliations::active_for_artist(conn, artist_id, now)?)
}

/// Record an accepted label invitation.
///
/// `label_percentage` of `None` defers to the platform default split.
///
/// # Errors
///
/// - [`LedgerError::Validation`] if either id is empty, the percentage is
///   outside `[0, 100]`, or the pair is already actively affiliated
pub fn create_affiliation(
    conn: &mut Connection,
    label_admin_id: &str,
    artist_id: &str,
    label_percentage: Option<Decimal>,
    now: u64,
) -> Result<Affiliation> {
    if label_admin_id.trim().is_empty() || artist_id.trim().is_empty() {
        return Err(LedgerError::Validation(
            "label admin and artist ids are required".into(),
        ));
    }
    if let Some(pct) = label_percentage {
        validate_percentage(pct)?;
    }

    let tx = immediate(conn)?;
    if affiliations::active_for_pair(&tx, label_admin_id, artist_id)?.is_some() {
        tracing::warn!(label = label_admin_id, artist = artist_id, "duplicate affiliation refused");
        return Err(LedgerError::Validation(format!(
            "{label_admin_id} is already affiliated with {artist_id}"
        )));
    }

    let affiliation = Affiliation {
        id: uuid::Uuid::new_v4(),
        label_admin_id: label_admin_id.to_string(),
        artist_id: artist_id.to_string(),
        label_percentage,
        status: AffiliationStatus::Active,
        effective_from: now,
        effective_until: None,
    };
    affiliations::insert(&tx, &affiliation, now)?;
    tx.commit()?;

    tracing::info!(
        affiliation = %affiliation.id,
        label = label_admin_id,
        artist = artist_id,
        label_pct = ?label_percentage,
        "affiliation created"
    );

    Ok(affiliation)
}

/// End an affiliation at `now`.
///
/// # Errors
///
/// - [`LedgerError::NotFound`] if the affiliation does not exist
/// - [`LedgerError::InvalidTransition`] if it has already ended
pub fn end_affiliation(conn: &Connection, id: &AffiliationId, now: u64) -> Result<()> {
    if affiliations::deactivate(conn, id, now)? {
        tracing::info!(affiliation = %id, "affiliation ended");
        return Ok(());
    }

    match affiliations::get(conn, id)? {
        None => Err(LedgerError::NotFound(format!("affiliation {id}"))),
        Some(a) => Err(LedgerError::InvalidTransition {
            what: format!("affiliation {id}"),
            from: a.status.to_string(),
            to: AffiliationStatus::Inactive.to_string(),
        }),
    }
}

/// Every affiliation a label admin has had, newest first.
pub fn affiliations_for_label(conn: &Connection, label_admin_id: &str) -> Result<Vec<Affiliation>> {
    Ok(affiliations::for_label(conn, label_admin_id)?)
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Pin `percentage` as the subject's own share, replacing any active
/// override for that subject. The other side receives the complement.
///
/// # Errors
///
/// - [`LedgerError::Validation`] if the subject id is empty or the
///   percentage is outside `[0, 100]`
pub fn set_override(
    conn: &mut Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
    percentage: Decimal,
    now: u64,
) -> Result<SplitOverride> {
    if subject_id.trim().is_empty() {
        return Err(LedgerError::Validation("subject id is required".into()));
    }
    validate_percentage(percentage)?;

    let complement = Decimal::ONE_HUNDRED - percentage;
    let (artist_percentage, label_percentage) = match subject_kind {
        PrincipalKind::Artist => (percentage, complement),
        PrincipalKind::LabelAdmin => (complement, percentage),
    };

    let split = SplitOverride {
        id: uuid::Uuid::new_v4(),
        subject_id: subject_id.to_string(),
        subject_kind,
        artist_percentage,
        label_percentage,
        is_active: true,
        effective_from: now,
        effective_until: None,
    };

    let tx = immediate(conn)?;
    let replaced = overrides::deactivate_active(&tx, subject_id, subject_kind, now)?;
    overrides::insert(&tx, &split, now)?;
    tx.commit()?;

    tracing::info!(
        subject = subject_id,
        kind = %subject_kind,
        %percentage,
        replaced,
        "split override set"
    );

    Ok(split)
}

/// Soft-disable the subject's active override.
///
/// # Errors
///
/// - [`LedgerError::NotFound`] if the subject has no active override
pub fn deactivate_override(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
    now: u64,
) -> Result<()> {
    if overrides::deactivate_active(conn, subject_id, subject_kind, now)? == 0 {
        return Err(LedgerError::NotFound(format!(
            "active override for {subject_kind} {subject_id}"
        )));
    }
    tracing::info!(subject = subject_id, kind = %subject_kind, "split override deactivated");
    Ok(())
}

/// The subject's override in force at `now`.
pub fn get_active_override(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
    now: u64,
) -> Result<Option<SplitOverride>> {
    Ok(overrides::active_for_subject(conn, subject_id, subject_kind, now)?)
}

/// Every override in force at `now`.
pub fn list_active_overrides(conn: &Connection, now: u64) -> Result<Vec<SplitOverride>> {
    Ok(overrides::list_active(conn, now)?)
}

/// All overrides a subject ever had, newest first.
pub fn override_history(
    conn: &Connection,
    subject_id: &str,
    subject_kind: PrincipalKind,
) -> Result<Vec<SplitOverride>> {
    Ok(overrides::history(conn, subject_id, subject_kind)?)
}

// ---------------------------------------------------------------------------
// Platform default
// ---------------------------------------------------------------------------

/// The platform-wide default split.
pub fn platform_default_split(conn: &Connection) -> Result<SplitPercentages> {
    Ok(SplitPercentages {
        artist_pct: settings::get_decimal(conn, settings::PLATFORM_ARTIST_PCT, DEFAULT_ARTIST_PCT)?,
        label_pct: settings::get_decimal(conn, settings::PLATFORM_LABEL_PCT, DEFAULT_LABEL_PCT)?,
    })
}

/// Change the platform default so artists receive `artist_pct`.
///
/// # Errors
///
/// - [`LedgerError::Validation`] if `artist_pct` is outside `[0, 100]`
pub fn set_platform_default_split(conn: &mut Connection, artist_pct: Decimal) -> Result<SplitPercentages> {
    validate_percentage(artist_pct)?;
    let split = SplitPercentages::from_artist(artist_pct);

    let tx = immediate(conn)?;
    settings::set(&tx, settings::PLATFORM_ARTIST_PCT, &split.artist_pct.to_string())?;
    settings::set(&tx, settings::PLATFORM_LABEL_PCT, &split.label_pct.to_string())?;
    tx.commit()?;

    tracing::info!(artist_pct = %split.artist_pct, label_pct = %split.label_pct, "platform split updated");
    Ok(split)
}

// ---------------------------------------------------------------------------
// Resolution input
// ---------------------------------------------------------------------------

/// Gather everything the resolver needs for one earning of `artist_id`.
///
/// Overrides are only looked up when an affiliation is in force; the label
/// override is the one pinned to that affiliation's label admin.
pub fn split_context(conn: &Connection, artist_id: &str, now: u64) -> Result<SplitContext> {
    let platform_default = platform_default_split(conn)?;

    let Some(affiliation) = get_active_affiliation(conn, artist_id, now)? else {
        return Ok(SplitContext {
            affiliation: None,
            artist_override: None,
            label_override: None,
            platform_default,
        });
    };

    let artist_override = get_active_override(conn, artist_id, PrincipalKind::Artist, now)?;
    let label_override = get_active_override(
        conn,
        &affiliation.label_admin_id,
        PrincipalKind::LabelAdmin,
        now,
    )?;

    Ok(SplitContext {
        affiliation: Some(affiliation),
        artist_override,
        label_override,
        platform_default,
    })
}

/// Sanity-check the stored platform default.
pub fn check_platform_default(conn: &Connection) -> Result<()> {
    Ok(validate_split("platform_default", &platform_default_split(conn)?)?)
}
