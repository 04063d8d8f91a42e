// Copyright (c) 2024 The Botho Foundation

//! Typed wrappers for the node methods the bridge calls.

use std::{collections::BTreeMap, sync::Arc};

use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::{
    types::{
        parse, AddressValidation, AssetData, BlockchainInfo, DecodedTransaction, TxOutInfo,
        WalletTransaction,
    },
    RpcGateway,
};
use crate::error::RpcError;

/// Named-parameter calls against a node, decoded into typed responses.
#[derive(Clone)]
pub struct NodeApi {
    gateway: Arc<dyn RpcGateway>,
}

impl NodeApi {
    pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
        Self { gateway }
    }

    /// Look up an in-wallet transaction. `None` if the node returned null.
    pub async fn get_transaction(&self, txid: &str) -> Result<Option<WalletTransaction>, RpcError> {
        const METHOD: &str = "gettransaction";
        let value = self.gateway.invoke(METHOD, json!({ "txid": txid })).await?;
        if value.is_null() {
            return Ok(None);
        }
        parse(METHOD, value).map(Some)
    }

    /// Raw hex of any transaction the node knows about.
    pub async fn get_raw_transaction(&self, txid: &str) -> Result<String, RpcError> {
        const METHOD: &str = "getrawtransaction";
        let value = self.gateway.invoke(METHOD, json!({ "txid": txid })).await?;
        let hex_str: String = parse(METHOD, value)?;
        hex::decode(&hex_str)
            .map_err(|e| RpcError::protocol(METHOD, format!("result is not hex: {}", e)))?;
        Ok(hex_str)
    }

    pub async fn decode_raw_transaction(&self, hex_str: &str) -> Result<DecodedTransaction, RpcError> {
        const METHOD: &str = "decoderawtransaction";
        let value = self
            .gateway
            .invoke(METHOD, json!({ "hexstring": hex_str }))
            .await?;
        parse(METHOD, value)
    }

    /// Fetch and decode a transaction that need not belong to the wallet.
    pub async fn public_transaction(&self, txid: &str) -> Result<DecodedTransaction, RpcError> {
        let hex_str = self.get_raw_transaction(txid).await?;
        self.decode_raw_transaction(&hex_str).await
    }

    /// Output 0 of `txid`, or `None` once it is spent or unknown.
    pub async fn get_tx_out(&self, txid: &str) -> Result<Option<TxOutInfo>, RpcError> {
        const METHOD: &str = "gettxout";
        let value = self
            .gateway
            .invoke(METHOD, json!({ "txid": txid, "n": 0 }))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        parse(METHOD, value).map(Some)
    }

    /// Confirmation count of an unspent output 0.
    pub async fn transaction_confirmations(&self, txid: &str) -> Result<Option<i64>, RpcError> {
        Ok(self.get_tx_out(txid).await?.map(|out| out.confirmations))
    }

    pub async fn validate_address(&self, address: &str) -> Result<AddressValidation, RpcError> {
        const METHOD: &str = "validateaddress";
        let value = self
            .gateway
            .invoke(METHOD, json!({ "address": address }))
            .await?;
        parse(METHOD, value)
    }

    /// Wallet balances of assets matching `asset`, keyed by exact name.
    pub async fn list_my_assets(&self, asset: &str) -> Result<BTreeMap<String, Decimal>, RpcError> {
        const METHOD: &str = "listmyassets";
        let value = self.gateway.invoke(METHOD, json!({ "asset": asset })).await?;
        if value.is_null() {
            return Ok(BTreeMap::new());
        }
        parse(METHOD, value)
    }

    /// Send `quantity` units of `asset` and return the transaction ids.
    pub async fn transfer(
        &self,
        asset: &str,
        quantity: u64,
        to_address: &str,
    ) -> Result<Vec<String>, RpcError> {
        const METHOD: &str = "transfer";
        let value = self
            .gateway
            .invoke(
                METHOD,
                json!({ "asset_name": asset, "qty": quantity, "to_address": to_address }),
            )
            .await?;
        parse(METHOD, value)
    }

    pub async fn get_asset_data(&self, asset: &str) -> Result<Option<AssetData>, RpcError> {
        const METHOD: &str = "getassetdata";
        let value = self
            .gateway
            .invoke(METHOD, json!({ "asset_name": asset }))
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        parse(METHOD, value).map(Some)
    }

    pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        const METHOD: &str = "getblockchaininfo";
        let value = self.gateway.invoke(METHOD, Value::Null).await?;
        parse(METHOD, value)
    }

    pub async fn get_block_count(&self) -> Result<u64, RpcError> {
        const METHOD: &str = "getblockcount";
        let value = self.gateway.invoke(METHOD, Value::Null).await?;
        parse(METHOD, value)
    }
}
