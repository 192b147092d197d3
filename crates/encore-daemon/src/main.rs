//! encore-daemon: the earnings ledger service.
//!
//! Single OS process running a Tokio async runtime. The API layer talks to
//! the daemon via JSON-RPC over a Unix socket. Every request works on its
//! own SQLite connection; WAL mode and `BEGIN IMMEDIATE` writes keep
//! concurrent requests from observing or producing torn ledger state.

mod commands;
mod config;
mod rpc;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Ledger database file.
    pub db_path: PathBuf,
    /// Configuration.
    pub config: DaemonConfig,
}

impl DaemonState {
    /// Create the data directory and bring the database schema up to date.
    pub fn open(config: DaemonConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.data_dir())?;
        let db_path = config.db_path();
        let conn = encore_db::open(&db_path)?;

        if let Err(e) = encore_ledger::registry::check_platform_default(&conn) {
            warn!("platform default split is unusable: {}", e);
        }

        Ok(Self { db_path, config })
    }

    /// A fresh connection for one request.
    pub fn connect(&self) -> encore_db::Result<rusqlite::Connection> {
        encore_db::connect(&self.db_path, self.config.busy_timeout())
    }
}

fn init_tracing(config: &DaemonConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("encore={}", config.advanced.log_level).parse()?);

    if config.advanced.log_file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.advanced.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    init_tracing(&config)?;
    info!("Encore daemon starting");

    // 3. Open database and build state
    let state = Arc::new(DaemonState::open(config)?);
    info!("Ledger database at {:?}", state.db_path);

    // 4. Start IPC server
    let socket_path = state.config.socket_path();
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 5. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
