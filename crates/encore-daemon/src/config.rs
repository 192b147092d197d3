//! Configuration file management.

use std::path::PathBuf;
use std::time::Duration;

use encore_ledger::payout::PayoutPolicy;
use encore_types::{is_currency_code, DEFAULT_CURRENCY, DEFAULT_MINIMUM_PAYOUT};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Ledger business rules.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Local RPC settings.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// How long a connection waits for the write lock before giving up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Currency assumed when a request does not name one.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Smallest payout a principal may request.
    #[serde(default = "default_minimum_payout")]
    pub minimum_payout: Decimal,
}

/// RPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

// Default value functions

fn default_busy_timeout_ms() -> u64 {
    encore_db::DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_minimum_payout() -> Decimal {
    DEFAULT_MINIMUM_PAYOUT
}

fn default_socket_name() -> String {
    "encore.sock".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            minimum_payout: default_minimum_payout(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: DaemonConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !is_currency_code(&self.ledger.currency) {
            anyhow::bail!("ledger.currency {:?} is not an ISO-4217 code", self.ledger.currency);
        }
        if self.ledger.minimum_payout < Decimal::ZERO {
            anyhow::bail!("ledger.minimum_payout must not be negative");
        }
        if self.rpc.socket_name.is_empty() {
            anyhow::bail!("rpc.socket_name must not be empty");
        }
        Ok(())
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Ledger database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("encore.db")
    }

    /// RPC socket file.
    pub fn socket_path(&self) -> PathBuf {
        self.data_dir().join(&self.rpc.socket_name)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    pub fn payout_policy(&self) -> PayoutPolicy {
        PayoutPolicy {
            minimum: self.ledger.minimum_payout,
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("ENCORE_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Encore")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".encore")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/encore"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.ledger.currency, "GBP");
        assert_eq!(config.ledger.minimum_payout, dec!(50));
        assert_eq!(config.rpc.socket_name, "encore.sock");
        assert_eq!(config.advanced.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let parsed = DaemonConfig::parse(&toml_str).expect("parse");
        assert_eq!(parsed.ledger.minimum_payout, dec!(50));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = DaemonConfig::parse(
            r#"
            [storage]
            data_dir = "/var/lib/encore"

            [ledger]
            minimum_payout = "25.00"
            "#,
        )
        .expect("parse");
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/encore/encore.db"));
        assert_eq!(config.socket_path(), PathBuf::from("/var/lib/encore/encore.sock"));
        assert_eq!(config.payout_policy().minimum, dec!(25));
        assert_eq!(config.ledger.currency, "GBP");
        assert_eq!(config.busy_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_bad_currency_rejected() {
        let result = DaemonConfig::parse(
            r#"
            [ledger]
            currency = "pounds"
            "#,
        );
        assert!(result.is_err());
    }
}
