//! Split configuration handlers: overrides, affiliations, platform default.

use std::sync::Arc;

use encore_ledger::registry;
use encore_types::principal::PrincipalKind;
use encore_types::AffiliationId;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{now, parse, with_ledger};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

#[derive(Deserialize)]
struct OverrideParams {
    subject_id: String,
    subject_kind: PrincipalKind,
    percentage: Decimal,
}

pub async fn set_split_override(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: OverrideParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        registry::set_override(conn, &p.subject_id, p.subject_kind, p.percentage, now)
    })
    .await
}

#[derive(Deserialize)]
struct SubjectParams {
    subject_id: String,
    subject_kind: PrincipalKind,
}

pub async fn deactivate_split_override(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: SubjectParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        registry::deactivate_override(conn, &p.subject_id, p.subject_kind, now)?;
        Ok(serde_json::json!({ "deactivated": true }))
    })
    .await
}

#[derive(Deserialize)]
struct OverridesParams {
    #[serde(default)]
    subject_id: Option<String>,
    #[serde(default)]
    subject_kind: Option<PrincipalKind>,
}

/// One subject's override history, or every override currently in force.
pub async fn get_split_overrides(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: OverridesParams = parse(params)?;
    let now = now();
    match (p.subject_id, p.subject_kind) {
        (Some(id), Some(kind)) => {
            with_ledger(state, move |conn| registry::override_history(conn, &id, kind)).await
        }
        (None, None) => {
            with_ledger(state, move |conn| registry::list_active_overrides(conn, now)).await
        }
        _ => Err(RpcError::invalid_params(
            "subject_id and subject_kind must be given together",
        )),
    }
}

#[derive(Deserialize)]
struct ArtistParams {
    artist_id: String,
}

pub async fn get_active_affiliation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: ArtistParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        registry::get_active_affiliation(conn, &p.artist_id, now)
    })
    .await
}

#[derive(Deserialize)]
struct CreateAffiliationParams {
    label_admin_id: String,
    artist_id: String,
    #[serde(default)]
    label_percentage: Option<Decimal>,
}

pub async fn create_affiliation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: CreateAffiliationParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        registry::create_affiliation(conn, &p.label_admin_id, &p.artist_id, p.label_percentage, now)
    })
    .await
}

#[derive(Deserialize)]
struct EndAffiliationParams {
    affiliation_id: AffiliationId,
}

pub async fn end_affiliation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: EndAffiliationParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        registry::end_affiliation(conn, &p.affiliation_id, now)?;
        Ok(serde_json::json!({ "ended": true }))
    })
    .await
}

pub async fn get_platform_split(state: &Arc<DaemonState>) -> Result {
    with_ledger(state, |conn| registry::platform_default_split(conn)).await
}

#[derive(Deserialize)]
struct PlatformSplitParams {
    artist_percentage: Decimal,
}

pub async fn set_platform_split(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: PlatformSplitParams = parse(params)?;
    with_ledger(state, move |conn| {
        registry::set_platform_default_split(conn, p.artist_percentage)
    })
    .await
}
