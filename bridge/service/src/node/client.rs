// Copyright (c) 2024 The Botho Foundation

//! JSON-RPC 2.0 over HTTP with basic authentication.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use asset_bridge_core::NodeConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::RpcGateway;
use crate::error::RpcError;

/// JSON-RPC request ID counter
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// HTTP connection to a node's RPC port.
#[derive(Debug, Clone)]
pub struct NodeClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
}

impl NodeClient {
    /// Create a client for the configured node.
    pub fn new(config: &NodeConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.rpc_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcGateway for NodeClient {
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
            method,
            params,
        };
        trace!(method, id = request.id, "Sending RPC request");

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            method,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "RPC response"
        );

        // Nodes report RPC errors with a 500 status and a JSON-RPC body, so
        // look at the body before the status.
        let parsed = match serde_json::from_slice::<JsonRpcResponse>(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Http {
                    status: status.as_u16(),
                })
            }
            Err(e) => {
                return Err(RpcError::protocol(
                    method,
                    format!("invalid JSON-RPC body: {}", e),
                ))
            }
        };

        if let Some(error) = parsed.error {
            return Err(RpcError::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
            });
        }

        Ok(parsed.result.unwrap_or(Value::Null))
    }
}
