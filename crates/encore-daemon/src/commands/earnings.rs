//! Earnings command handlers: distribution, ledger entries, label earnings.

use std::sync::Arc;

use encore_ledger::{distribution, store};
use encore_types::ledger::{EntryStatus, SourceEvent};
use encore_types::EntryId;
use serde::Deserialize;
use serde_json::Value;

use super::{now, parse, with_ledger};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

#[derive(Deserialize)]
struct DistributeParams {
    event: SourceEvent,
    idempotency_key: String,
}

/// Turn a reported earning into ledger entries, splitting it if the artist
/// is affiliated. Replays of the same key return the original outcome.
pub async fn distribute_earning(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: DistributeParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| {
        distribution::distribute(conn, &p.event, &p.idempotency_key, now)
    })
    .await
}

#[derive(Deserialize)]
struct EntriesParams {
    principal_id: String,
    #[serde(default)]
    status: Option<EntryStatus>,
}

/// A principal's ledger entries, oldest first.
pub async fn get_ledger_entries(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: EntriesParams = parse(params)?;
    with_ledger(state, move |conn| {
        store::query_by_principal(conn, &p.principal_id, p.status)
    })
    .await
}

#[derive(Deserialize)]
struct TransitionParams {
    entry_id: EntryId,
    from: EntryStatus,
    to: EntryStatus,
}

/// Move a ledger entry between statuses (hold, release, settle, cancel).
pub async fn transition_entry(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: TransitionParams = parse(params)?;
    with_ledger(state, move |conn| {
        store::transition(conn, &p.entry_id, p.from, p.to)?;
        store::get(conn, &p.entry_id)
    })
    .await
}

#[derive(Deserialize)]
struct LabelParams {
    label_admin_id: String,
}

/// Per-artist totals and the underlying split records for a label admin.
pub async fn get_label_earnings(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: LabelParams = parse(params)?;
    with_ledger(state, move |conn| {
        let summary = distribution::label_earnings_summary(conn, &p.label_admin_id)?;
        let records = distribution::list_shared_earnings(conn, &p.label_admin_id)?;
        Ok(serde_json::json!({
            "summary": summary,
            "records": records,
        }))
    })
    .await
}
