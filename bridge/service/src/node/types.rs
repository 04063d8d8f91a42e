// Copyright (c) 2024 The Botho Foundation

//! Typed node responses.
//!
//! Every method the bridge calls gets a struct here and goes through
//! [`parse`], so a response of the wrong shape becomes
//! [`RpcError::Protocol`] naming the method and the offending field.

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

/// Decode a raw `result` into the type expected for `method`.
pub fn parse<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::protocol(method, e.to_string()))
}

/// Accepts `true`/`false` as well as the `0`/`1` some node versions emit.
mod flag {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Int(0) => Ok(false),
            Flag::Int(1) => Ok(true),
            Flag::Int(n) => Err(de::Error::custom(format!("expected 0 or 1, got {}", n))),
        }
    }
}

/// `gettransaction`: an in-wallet transaction record.
///
/// The fields the exchange depends on are optional here so that the caller
/// can look at `details` before insisting on numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub txid: Option<String>,
    pub amount: Option<Decimal>,
    pub fee: Option<Decimal>,
    pub confirmations: Option<i64>,
    pub blockhash: Option<String>,
    pub blocktime: Option<i64>,
    pub time: Option<i64>,
    #[serde(default)]
    pub details: Vec<TransactionDetail>,
    #[serde(default)]
    pub asset_details: Vec<AssetDetail>,
}

/// Per-address line of a wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub address: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub vout: Option<u32>,
}

/// Per-address asset line of a wallet transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    pub asset_type: Option<String>,
    pub asset_name: String,
    pub amount: Decimal,
    pub address: Option<String>,
    pub vout: Option<u32>,
    pub category: Option<String>,
}

/// `decoderawtransaction`: a full transaction with inputs and outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<TxInput>,
    #[serde(default)]
    pub vout: Vec<TxOutput>,
}

/// Reference to the output an input spends. Coinbase inputs have no `txid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub txid: Option<String>,
    pub vout: Option<u32>,
    pub coinbase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: Decimal,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptPubKey {
    #[serde(rename = "type")]
    pub script_type: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
    pub asset: Option<AssetAmount>,
}

/// Asset carried by an output script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetAmount {
    pub name: String,
    pub amount: Decimal,
}

/// `gettxout`: an unspent output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutInfo {
    pub bestblock: String,
    pub confirmations: i64,
    pub value: Decimal,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: ScriptPubKey,
    #[serde(default)]
    pub coinbase: bool,
}

/// `validateaddress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressValidation {
    pub isvalid: bool,
    pub address: Option<String>,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: Option<String>,
    pub ismine: Option<bool>,
    pub iswatchonly: Option<bool>,
    pub isscript: Option<bool>,
}

/// `getassetdata`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetData {
    pub name: String,
    pub amount: Decimal,
    pub units: u8,
    #[serde(with = "flag_serde")]
    pub reissuable: bool,
    #[serde(with = "flag_serde")]
    pub has_ipfs: bool,
    pub ipfs_hash: Option<String>,
    pub txid_hash: Option<String>,
    pub verifier_string: Option<String>,
}

/// Serialize flags as plain booleans, deserialize leniently.
mod flag_serde {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        super::flag::deserialize(deserializer)
    }
}

/// `getblockchaininfo`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub bestblockhash: String,
    pub difficulty: f64,
    pub mediantime: Option<i64>,
    pub verificationprogress: f64,
    pub chainwork: Option<String>,
    pub size_on_disk: Option<u64>,
    #[serde(default)]
    pub pruned: bool,
}
