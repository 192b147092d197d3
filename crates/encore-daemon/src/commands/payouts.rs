//! Payout command handlers.

use std::sync::Arc;

use encore_ledger::payout;
use encore_types::payout::PayoutStatus;
use encore_types::principal::Principal;
use encore_types::PayoutRequestId;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{now, parse, with_ledger};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

#[derive(Deserialize)]
struct RequestParams {
    principal: Principal,
    amount: Decimal,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    bank_details: Value,
}

/// File a payout request against the principal's available balance.
pub async fn request_payout(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: RequestParams = parse(params)?;
    let currency = p
        .currency
        .unwrap_or_else(|| state.config.ledger.currency.clone());
    let policy = state.config.payout_policy();
    let now = now();
    with_ledger(state, move |conn| {
        payout::request_payout(
            conn,
            &p.principal,
            p.amount,
            &currency,
            p.bank_details,
            &policy,
            now,
        )
    })
    .await
}

#[derive(Deserialize)]
struct ApproveParams {
    request_id: PayoutRequestId,
}

/// Approve a pending request and debit the principal.
pub async fn approve_payout(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: ApproveParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| payout::approve(conn, &p.request_id, now)).await
}

#[derive(Deserialize)]
struct RejectParams {
    request_id: PayoutRequestId,
    reason: String,
}

/// Reject a pending request with a reason.
pub async fn reject_payout(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: RejectParams = parse(params)?;
    let now = now();
    with_ledger(state, move |conn| payout::reject(conn, &p.request_id, &p.reason, now)).await
}

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    principal_id: Option<String>,
    #[serde(default)]
    status: Option<PayoutStatus>,
}

/// A principal's requests (newest first), or the queue for one status.
pub async fn get_payout_requests(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: ListParams = parse(params)?;
    with_ledger(state, move |conn| match p.principal_id {
        Some(principal_id) => payout::list_for_principal(conn, &principal_id),
        None => payout::list_by_status(conn, p.status.unwrap_or(PayoutStatus::Pending)),
    })
    .await
}
