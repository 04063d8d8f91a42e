// Copyright (c) 2024 The Botho Foundation

//! Wallet asset balance and asset transfers.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{BalanceError, DispatchError},
    node::NodeApi,
};

/// Reads how much of an asset the wallet holds.
#[derive(Clone)]
pub struct AssetBalanceChecker {
    api: NodeApi,
}

impl AssetBalanceChecker {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Whole units of `asset` held by the wallet.
    ///
    /// Only the exact name counts; sub-assets returned by the node's prefix
    /// match are ignored. Fractional balances are truncated.
    pub async fn check_balance(&self, asset: &str) -> Result<u64, BalanceError> {
        let assets = self.api.list_my_assets(asset).await?;
        let balance = assets.get(asset).ok_or_else(|| BalanceError::NotFound {
            asset: asset.to_string(),
        })?;

        let whole = balance.trunc().to_u64().unwrap_or(0);
        debug!(asset, balance = whole, "Wallet asset balance");
        Ok(whole)
    }
}

/// Result of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    /// First transaction id returned by the node
    pub txid: String,
    /// All transaction ids returned by the node
    pub txids: Vec<String>,
}

/// Sends assets out of the wallet.
#[derive(Clone)]
pub struct AssetDispatcher {
    api: NodeApi,
}

impl AssetDispatcher {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    pub async fn dispatch(
        &self,
        asset: &str,
        quantity: u64,
        to_address: &str,
    ) -> Result<TransferResult, DispatchError> {
        let txids = self.api.transfer(asset, quantity, to_address).await?;
        let txid = txids.first().cloned().ok_or(DispatchError::EmptyResult)?;

        info!(asset, quantity, to = to_address, %txid, "Asset transfer sent");
        Ok(TransferResult { txid, txids })
    }
}
