//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! parse their params, then run the ledger call on the blocking pool with a
//! connection of their own, so one slow write never stalls the runtime.

pub mod earnings;
pub mod payouts;
pub mod splits;
pub mod wallet;

use std::sync::Arc;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Deserialize a method's params object.
pub(crate) fn parse<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, RpcError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params.clone()
    };
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Run a ledger operation against a fresh connection on the blocking pool
/// and serialize its result.
pub(crate) async fn with_ledger<T, F>(state: &Arc<DaemonState>, op: F) -> Result
where
    T: serde::Serialize + Send + 'static,
    F: FnOnce(&mut Connection) -> encore_ledger::Result<T> + Send + 'static,
{
    let state = state.clone();
    let value = tokio::task::spawn_blocking(move || {
        let mut conn = state
            .connect()
            .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
        op(&mut conn).map_err(RpcError::from)
    })
    .await
    .map_err(|e| RpcError::internal_error(&format!("worker failed: {e}")))??;

    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

/// Current Unix time in seconds.
pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
