// Copyright (c) 2024 The Botho Foundation

//! Bridge configuration types.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::policy::ExchangePolicy;

/// Errors raised while loading or checking a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Node RPC connection
    pub node: NodeConfig,

    /// Exchange policy settings
    pub exchange: ExchangeSettings,

    /// Processed-transaction ledger
    #[serde(default)]
    pub ledger: LedgerSettings,
}

/// Node JSON-RPC connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// RPC host name or IP
    pub host: String,

    /// RPC port
    pub port: u16,

    /// RPC user for basic authentication
    pub username: String,

    /// RPC password for basic authentication
    pub password: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// What to send, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    /// Wallet address watched for incoming payments
    pub receive_address: String,

    /// Asset dispensed in exchange
    pub asset: String,

    /// Asset units per whole unit of native currency received
    #[serde(default)]
    pub multiplier: Option<u32>,

    /// Confirmations required before dispensing
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,

    /// Serialize balance check and transfer per asset within this process
    #[serde(default)]
    pub serialize_dispatch: bool,
}

/// Idempotency ledger settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Path to SQLite database; no ledger when unset
    pub db_path: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_confirmations() -> u32 {
    1
}

impl NodeConfig {
    /// Base URL of the node's RPC endpoint.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.host.is_empty() {
            return Err(ConfigError::Invalid("node.host cannot be empty".to_string()));
        }
        if self.node.port == 0 {
            return Err(ConfigError::Invalid("node.port cannot be 0".to_string()));
        }
        if self.node.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "node.timeout_secs must be at least 1".to_string(),
            ));
        }

        self.policy().validate().map_err(ConfigError::Invalid)?;

        if let Some(path) = &self.ledger.db_path {
            if path.is_empty() {
                return Err(ConfigError::Invalid(
                    "ledger.db_path cannot be empty when set".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// The exchange policy described by this configuration.
    pub fn policy(&self) -> ExchangePolicy {
        ExchangePolicy {
            expected_receive_address: self.exchange.receive_address.clone(),
            asset_name: self.exchange.asset.clone(),
            multiplier: self.exchange.multiplier,
            min_confirmations: self.exchange.min_confirmations,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig {
                host: "127.0.0.1".to_string(),
                port: 8766,
                username: "rpcuser".to_string(),
                password: "rpcpass".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            exchange: ExchangeSettings {
                receive_address: String::new(),
                asset: String::new(),
                multiplier: None,
                min_confirmations: default_min_confirmations(),
                serialize_dispatch: false,
            },
            ledger: LedgerSettings::default(),
        }
    }
}
