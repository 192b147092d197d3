//! Wallet command handlers.

use std::sync::Arc;

use encore_ledger::wallet;
use serde::Deserialize;
use serde_json::Value;

use super::{parse, with_ledger};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

#[derive(Deserialize)]
struct BalanceParams {
    principal_id: String,
    #[serde(default)]
    currency: Option<String>,
}

/// Balance in one currency (the configured ledger currency by default).
pub async fn get_wallet_balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: BalanceParams = parse(params)?;
    let currency = p
        .currency
        .unwrap_or_else(|| state.config.ledger.currency.clone());
    with_ledger(state, move |conn| wallet::balance(conn, &p.principal_id, &currency)).await
}

/// One balance per currency the principal holds.
pub async fn get_wallet_balances(state: &Arc<DaemonState>, params: &Value) -> Result {
    let p: BalanceParams = parse(params)?;
    with_ledger(state, move |conn| wallet::balances(conn, &p.principal_id)).await
}
