//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers. The
//! caller is the trusted API layer, which has already authenticated the
//! principal it passes in; no authorisation happens here.

use std::path::PathBuf;
use std::sync::Arc;

use encore_ledger::LedgerError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn with_detail(code: i32, message: &str, detail: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::with_detail(-32602, "INVALID_PARAMS", detail)
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::with_detail(-32603, "INTERNAL_ERROR", detail)
    }

    // Ledger errors

    /// Not found (-32004).
    pub fn not_found(detail: &str) -> Self {
        Self::with_detail(-32004, "NOT_FOUND", detail)
    }

    /// Validation error (-32020).
    pub fn validation_error(detail: &str) -> Self {
        Self::with_detail(-32020, "VALIDATION_ERROR", detail)
    }

    /// Invalid transition (-32030).
    pub fn invalid_transition(what: &str, from: &str, to: &str) -> Self {
        Self {
            code: -32030,
            message: "INVALID_TRANSITION".to_string(),
            data: Some(serde_json::json!({"target": what, "from": from, "to": to})),
        }
    }

    /// Insufficient balance (-32040).
    pub fn insufficient_balance(requested: &str, available: &str, shortfall: &str) -> Self {
        Self {
            code: -32040,
            message: "INSUFFICIENT_BALANCE".to_string(),
            data: Some(serde_json::json!({
                "requested": requested,
                "available": available,
                "shortfall": shortfall,
            })),
        }
    }

    /// Below minimum payout (-32041).
    pub fn below_minimum(amount: &str, minimum: &str) -> Self {
        Self {
            code: -32041,
            message: "BELOW_MINIMUM".to_string(),
            data: Some(serde_json::json!({"amount": amount, "minimum": minimum})),
        }
    }

    /// Inconsistent split configuration (-32050).
    pub fn inconsistent_split_config(detail: &str) -> Self {
        Self::with_detail(-32050, "INCONSISTENT_SPLIT_CONFIG", detail)
    }
}

impl From<LedgerError> for RpcError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Validation(detail) => Self::validation_error(&detail),
            LedgerError::InvalidTransition { what, from, to } => {
                Self::invalid_transition(&what, &from, &to)
            }
            LedgerError::InsufficientBalance {
                requested,
                available,
                shortfall,
            } => Self::insufficient_balance(
                &requested.to_string(),
                &available.to_string(),
                &shortfall.to_string(),
            ),
            LedgerError::InconsistentSplitConfig(detail) => {
                Self::inconsistent_split_config(&detail)
            }
            LedgerError::BelowMinimum { amount, minimum } => {
                Self::below_minimum(&amount.to_string(), &minimum.to_string())
            }
            LedgerError::NotFound(detail) => Self::not_found(&detail),
            LedgerError::Db(e) => {
                error!("database error: {e}");
                Self::internal_error(&format!("db error: {e}"))
            }
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!("Dispatching RPC method: {}", method);

    let params = &request.params;
    let result = match method {
        // Earnings
        "distribute_earning" => commands::earnings::distribute_earning(&state, params).await,
        "get_ledger_entries" => commands::earnings::get_ledger_entries(&state, params).await,
        "transition_entry" => commands::earnings::transition_entry(&state, params).await,
        "get_label_earnings" => commands::earnings::get_label_earnings(&state, params).await,

        // Wallet
        "get_wallet_balance" => commands::wallet::get_wallet_balance(&state, params).await,
        "get_wallet_balances" => commands::wallet::get_wallet_balances(&state, params).await,

        // Payouts
        "request_payout" => commands::payouts::request_payout(&state, params).await,
        "approve_payout" => commands::payouts::approve_payout(&state, params).await,
        "reject_payout" => commands::payouts::reject_payout(&state, params).await,
        "get_payout_requests" => commands::payouts::get_payout_requests(&state, params).await,

        // Split configuration
        "set_split_override" => commands::splits::set_split_override(&state, params).await,
        "deactivate_split_override" => {
            commands::splits::deactivate_split_override(&state, params).await
        }
        "get_split_overrides" => commands::splits::get_split_overrides(&state, params).await,
        "get_active_affiliation" => {
            commands::splits::get_active_affiliation(&state, params).await
        }
        "create_affiliation" => commands::splits::create_affiliation(&state, params).await,
        "end_affiliation" => commands::splits::end_affiliation(&state, params).await,
        "get_platform_split" => commands::splits::get_platform_split(&state).await,
        "set_platform_split" => commands::splits::set_platform_split(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tokio::net::UnixStream;

    fn test_state() -> (tempfile::TempDir, Arc<DaemonState>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = DaemonConfig::default();
        config.storage.data_dir = dir.path().to_string_lossy().into_owned();
        let state = DaemonState::open(config).expect("open state");
        (dir, Arc::new(state))
    }

    async fn call(state: &Arc<DaemonState>, method: &str, params: Value) -> RpcResponse {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params,
        };
        dispatch_request(state.clone(), request).await
    }

    fn ok(resp: RpcResponse) -> Value {
        assert!(resp.error.is_none(), "unexpected error: {:?}", resp.error);
        resp.result.unwrap_or(Value::Null)
    }

    fn err(resp: RpcResponse) -> RpcError {
        assert!(resp.result.is_none(), "unexpected result: {:?}", resp.result);
        resp.error.unwrap_or_else(RpcError::invalid_request)
    }

    #[test]
    fn test_ledger_error_codes() {
        let e = RpcError::from(LedgerError::InsufficientBalance {
            requested: dec!(60.00),
            available: dec!(50.00),
            shortfall: dec!(10.00),
        });
        assert_eq!(e.code, -32040);
        assert_eq!(e.message, "INSUFFICIENT_BALANCE");
        assert_eq!(e.data.expect("data")["shortfall"], "10.00");

        let e = RpcError::from(LedgerError::Validation("bad".into()));
        assert_eq!(e.message, "VALIDATION_ERROR");

        let e = RpcError::from(LedgerError::BelowMinimum {
            amount: dec!(10),
            minimum: dec!(50),
        });
        assert_eq!(e.message, "BELOW_MINIMUM");

        let e = RpcError::from(LedgerError::InconsistentSplitConfig("x".into()));
        assert_eq!(e.code, -32050);

        let e = RpcError::method_not_found("unknown");
        assert_eq!(e.code, -32601);
    }

    #[test]
    fn test_rpc_response_shapes() {
        let resp = RpcResponse::success(json!(1), json!({"available": "0.00"}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        let resp = RpcResponse::error(json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method_and_version() {
        let (_dir, state) = test_state();
        assert_eq!(err(call(&state, "mint_money", json!({})).await).code, -32601);

        let request = RpcRequest {
            jsonrpc: "1.0".to_string(),
            id: json!(7),
            method: "get_platform_split".to_string(),
            params: Value::Null,
        };
        let resp = dispatch_request(state.clone(), request).await;
        assert_eq!(err(resp).code, -32600);
    }

    #[tokio::test]
    async fn test_split_and_payout_flow() {
        let (_dir, state) = test_state();

        ok(call(
            &state,
            "create_affiliation",
            json!({"label_admin_id": "label-1", "artist_id": "artist-1", "label_percentage": "20"}),
        )
        .await);

        let split = ok(call(
            &state,
            "distribute_earning",
            json!({
                "idempotency_key": "report-9:1",
                "event": {
                    "principal_id": "artist-1",
                    "amount": "100.00",
                    "currency": "GBP",
                    "platform": "spotify",
                    "earning_type": "stream_royalty"
                }
            }),
        )
        .await);
        assert_eq!(split["outcome"], "split");
        assert_eq!(split["artist_amount"], "80.00");
        assert_eq!(split["label_amount"], "20.00");

        // Settle the artist share, then pay it out.
        let artist_entry = split["artist_entry_id"].as_str().expect("artist entry").to_string();
        ok(call(
            &state,
            "transition_entry",
            json!({"entry_id": artist_entry, "from": "pending", "to": "paid"}),
        )
        .await);

        let balance = ok(call(&state, "get_wallet_balance", json!({"principal_id": "artist-1"})).await);
        assert_eq!(balance["available"], "80.00");

        let short = err(call(
            &state,
            "request_payout",
            json!({
                "principal": {"id": "artist-1", "kind": "artist"},
                "amount": "90.00",
                "bank_details": {"iban": "GB00TEST"}
            }),
        )
        .await);
        assert_eq!(short.message, "INSUFFICIENT_BALANCE");
        assert_eq!(short.data.expect("data")["shortfall"], "10.00");

        let request = ok(call(
            &state,
            "request_payout",
            json!({
                "principal": {"id": "artist-1", "kind": "artist"},
                "amount": "80.00",
                "bank_details": {"iban": "GB00TEST"}
            }),
        )
        .await);
        let approved = ok(call(
            &state,
            "approve_payout",
            json!({"request_id": request["id"]}),
        )
        .await);
        assert_eq!(approved["status"], "approved");

        let again = err(call(&state, "approve_payout", json!({"request_id": request["id"]})).await);
        assert_eq!(again.message, "INVALID_TRANSITION");

        let balance = ok(call(&state, "get_wallet_balance", json!({"principal_id": "artist-1"})).await);
        assert_eq!(balance["available"], "0.00");

        let label = ok(call(&state, "get_label_earnings", json!({"label_admin_id": "label-1"})).await);
        assert_eq!(label["summary"][0]["label_share"], "20.00");
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let (_dir, state) = test_state();
        let e = err(call(&state, "approve_payout", json!({"request_id": "not-a-uuid"})).await);
        assert_eq!(e.code, -32602);

        let e = err(call(
            &state,
            "set_split_override",
            json!({"subject_id": "artist-1", "subject_kind": "artist", "percentage": "150"}),
        )
        .await);
        assert_eq!(e.message, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_socket_roundtrip() {
        let (dir, state) = test_state();
        let socket_path = dir.path().join("test.sock");
        let server = RpcServer::new(state, socket_path.clone());
        let handle = tokio::spawn(async move { server.run().await });

        let mut stream = None;
        for _ in 0..50 {
            if let Ok(s) = UnixStream::connect(&socket_path).await {
                stream = Some(s);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let stream = stream.expect("server did not come up");

        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"get_platform_split\"}\nnot json\n")
            .await
            .expect("write");

        let mut lines = BufReader::new(reader).lines();
        let first: Value =
            serde_json::from_str(&lines.next_line().await.expect("read").expect("line")).expect("json");
        assert_eq!(first["id"], 3);
        assert_eq!(first["result"]["artist_pct"], "80");

        let second: Value =
            serde_json::from_str(&lines.next_line().await.expect("read").expect("line")).expect("json");
        assert_eq!(second["error"]["code"], -32700);

        handle.abort();
    }
}
