// Copyright (c) 2024 The Botho Foundation

//! Errors raised by node calls and the exchange components.

use thiserror::Error;

/// Node error code for an unknown transaction id, address or key.
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Failure of a single remote procedure call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The node could not be reached
    #[error("node unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-success HTTP status and no RPC error
    #[error("node returned HTTP {status}")]
    Http { status: u16 },

    /// The node answered with a JSON-RPC error object
    #[error("{method} failed with RPC error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The response did not have the expected shape
    #[error("unexpected {method} response: {detail}")]
    Protocol { method: String, detail: String },
}

impl RpcError {
    pub fn protocol(method: &str, detail: impl Into<String>) -> Self {
        RpcError::Protocol {
            method: method.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether the node answered that it has no such transaction or
    /// address. Other RPC error codes are node faults.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RpcError::Rpc {
                code: RPC_INVALID_ADDRESS_OR_KEY,
                ..
            }
        )
    }
}

/// Failure to inspect an in-wallet transaction.
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("could not look up transaction {txid}")]
    NotFound { txid: String },

    #[error("transaction {txid} has no details")]
    NoDetails { txid: String },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Failure to walk back to the sender for reasons other than a missing
/// previous output.
#[derive(Debug, Error)]
#[error("sender lookup failed while decoding {hop}: {source}")]
pub struct ResolutionError {
    /// Which transaction was being decoded ("payment" or "funding")
    pub hop: &'static str,
    #[source]
    pub source: RpcError,
}

/// Failure to read the wallet's asset balance.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("asset {asset} not found in wallet")]
    NotFound { asset: String },

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Failure of the asset transfer itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("transfer failed: {0}")]
    Rpc(#[from] RpcError),

    #[error("transfer returned no transaction id")]
    EmptyResult,
}

/// Failure of the processed-transaction ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode outcome: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("ledger lock poisoned")]
    Poisoned,

    #[error("corrupt ledger row for {txid}: {detail}")]
    Corrupt { txid: String, detail: String },
}
