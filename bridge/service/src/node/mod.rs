// Copyright (c) 2024 The Botho Foundation

//! Node access: the RPC gateway seam, its HTTP implementation and typed
//! wrappers for the methods the bridge uses.

mod api;
mod client;
pub mod types;

pub use api::NodeApi;
pub use client::NodeClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcError;

/// Sends one named command to the node and returns its raw `result`.
///
/// A `null` result is returned as `Value::Null`; interpreting it is up to the
/// caller.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}
