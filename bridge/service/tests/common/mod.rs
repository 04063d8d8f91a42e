// Copyright (c) 2024 The Botho Foundation

//! Scripted in-memory node for exercising the exchange workflow.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use asset_bridge::{RpcError, RpcGateway};
use asset_bridge_core::ExchangePolicy;
use async_trait::async_trait;
use serde_json::{json, Value};

pub const OUR_ADDRESS: &str = "RBridgeReceiveAddressXXXXXXXXXXXXX";
pub const SENDER: &str = "RSenderAddressYYYYYYYYYYYYYYYYYYYY";
pub const ASSET: &str = "BRIDGE_TOKEN";
pub const PAYMENT_TXID: &str = "pay01";
pub const FUNDING_TXID: &str = "fund01";

/// Failure to inject for a given method.
#[derive(Debug, Clone)]
pub enum Injected {
    Http(u16),
    Rpc(i64, &'static str),
    Malformed(Value),
}

impl Injected {
    fn to_error(&self, method: &str) -> Result<Value, RpcError> {
        match self {
            Injected::Http(status) => Err(RpcError::Http { status: *status }),
            Injected::Rpc(code, message) => Err(RpcError::Rpc {
                method: method.to_string(),
                code: *code,
                message: message.to_string(),
            }),
            Injected::Malformed(value) => Ok(value.clone()),
        }
    }
}

#[derive(Default)]
struct State {
    wallet: HashMap<String, Value>,
    raw: HashMap<String, String>,
    decoded: HashMap<String, Value>,
    valid_addresses: Vec<String>,
    balances: HashMap<String, u64>,
    failures: HashMap<String, Injected>,
    transfers: Vec<(String, u64, String)>,
    calls: Vec<String>,
}

/// Fake node keeping wallet, chain and asset state in memory.
///
/// Transfers debit the asset balance, so concurrent runs observe each other.
#[derive(Clone, Default)]
pub struct FakeNode {
    state: Arc<Mutex<State>>,
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node where `pay01` pays 3 to our address with 5 confirmations, was
    /// funded by output 1 of `fund01` owned by a valid sender, and the
    /// wallet holds 10 of the asset.
    pub fn standard() -> Self {
        let node = Self::new();
        node.add_wallet_tx(PAYMENT_TXID, receive_tx("3", 5));
        node.add_public_tx(
            PAYMENT_TXID,
            decoded_tx(PAYMENT_TXID, &[(FUNDING_TXID, 1)], &[]),
        );
        node.add_public_tx(
            FUNDING_TXID,
            decoded_tx(FUNDING_TXID, &[("root00", 0)], &[(0, "RChangeZZZ"), (1, SENDER)]),
        );
        node.add_valid_address(SENDER);
        node.set_balance(ASSET, 10);
        node
    }

    pub fn add_wallet_tx(&self, txid: &str, tx: Value) {
        self.state.lock().unwrap().wallet.insert(txid.to_string(), tx);
    }

    /// Make `txid` known to `getrawtransaction`/`decoderawtransaction`.
    pub fn add_public_tx(&self, txid: &str, decoded: Value) {
        let hex_str = hex::encode(txid.as_bytes());
        let mut state = self.state.lock().unwrap();
        state.raw.insert(txid.to_string(), hex_str.clone());
        state.decoded.insert(hex_str, decoded);
    }

    pub fn add_valid_address(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .valid_addresses
            .push(address.to_string());
    }

    pub fn set_balance(&self, asset: &str, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(asset.to_string(), amount);
    }

    pub fn fail(&self, method: &str, failure: Injected) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(method.to_string(), failure);
    }

    pub fn transfers(&self) -> Vec<(String, u64, String)> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn balance(&self, asset: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(asset)
            .copied()
            .unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn gateway(&self) -> Arc<dyn RpcGateway> {
        Arc::new(self.clone())
    }
}

fn not_found(method: &str) -> RpcError {
    RpcError::Rpc {
        method: method.to_string(),
        code: -5,
        message: "No information available about transaction".to_string(),
    }
}

fn param<'a>(params: &'a Value, name: &str) -> &'a str {
    params[name].as_str().unwrap_or_default()
}

#[async_trait]
impl RpcGateway for FakeNode {
    async fn invoke(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        // Every round trip is a suspension point, as with a real node.
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());

        if let Some(failure) = state.failures.get(method) {
            return failure.to_error(method);
        }

        match method {
            "gettransaction" => state
                .wallet
                .get(param(&params, "txid"))
                .cloned()
                .ok_or_else(|| not_found(method)),
            "getrawtransaction" => state
                .raw
                .get(param(&params, "txid"))
                .map(|hex_str| json!(hex_str))
                .ok_or_else(|| not_found(method)),
            "decoderawtransaction" => state
                .decoded
                .get(param(&params, "hexstring"))
                .cloned()
                .ok_or_else(|| RpcError::Rpc {
                    method: method.to_string(),
                    code: -22,
                    message: "TX decode failed".to_string(),
                }),
            "validateaddress" => {
                let address = param(&params, "address");
                let valid = state.valid_addresses.iter().any(|a| a == address);
                Ok(json!({ "isvalid": valid, "address": address }))
            }
            "listmyassets" => {
                let asset = param(&params, "asset");
                let assets: serde_json::Map<String, Value> = state
                    .balances
                    .iter()
                    .filter(|(name, _)| name.starts_with(asset))
                    .map(|(name, amount)| (name.clone(), json!(amount)))
                    .collect();
                Ok(Value::Object(assets))
            }
            "transfer" => {
                let asset = param(&params, "asset_name").to_string();
                let qty = params["qty"].as_u64().unwrap_or_default();
                let to = param(&params, "to_address").to_string();

                let balance = state.balances.entry(asset.clone()).or_default();
                *balance = balance.saturating_sub(qty);
                state.transfers.push((asset, qty, to));
                Ok(json!([format!("transfer{:04}", state.transfers.len())]))
            }
            other => Err(RpcError::Rpc {
                method: other.to_string(),
                code: -32601,
                message: "Method not found".to_string(),
            }),
        }
    }
}

/// Wallet record of a receive to our address.
pub fn receive_tx(amount: &str, confirmations: i64) -> Value {
    wallet_tx("receive", OUR_ADDRESS, amount, confirmations)
}

pub fn wallet_tx(category: &str, address: &str, amount: &str, confirmations: i64) -> Value {
    let amount: f64 = amount.parse().unwrap();
    json!({
        "amount": amount,
        "confirmations": confirmations,
        "details": [
            { "address": address, "category": category, "amount": amount, "vout": 0 }
        ]
    })
}

/// Decoded transaction with the given inputs (txid, vout) and outputs
/// (n, address).
pub fn decoded_tx(txid: &str, inputs: &[(&str, u32)], outputs: &[(u32, &str)]) -> Value {
    let vin: Vec<Value> = inputs
        .iter()
        .map(|(prev, vout)| json!({ "txid": prev, "vout": vout, "sequence": 4294967294u64 }))
        .collect();
    let vout: Vec<Value> = outputs
        .iter()
        .map(|(n, address)| {
            json!({
                "value": 1.0,
                "n": n,
                "scriptPubKey": { "type": "pubkeyhash", "addresses": [address] }
            })
        })
        .collect();
    json!({ "txid": txid, "vin": vin, "vout": vout })
}

pub fn policy() -> ExchangePolicy {
    ExchangePolicy {
        expected_receive_address: OUR_ADDRESS.to_string(),
        asset_name: ASSET.to_string(),
        multiplier: None,
        min_confirmations: 1,
    }
}
