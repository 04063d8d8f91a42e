// Copyright (c) 2024 The Botho Foundation

//! Finds the probable payer of a transaction by walking back two hops.

use asset_bridge_core::SenderCandidate;
use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::ResolutionError,
    node::{types::DecodedTransaction, NodeApi},
};

/// Produces a sender candidate for a payment transaction.
#[async_trait]
pub trait SenderResolver: Send + Sync {
    async fn resolve_sender(&self, txid: &str) -> Result<SenderCandidate, ResolutionError>;
}

/// Decodes the payment, then the transaction its first input spends, and
/// takes the first address of the referenced output.
#[derive(Clone)]
pub struct TwoHopSenderResolver {
    api: NodeApi,
}

impl TwoHopSenderResolver {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Decode a transaction. An unknown-id answer means there is nothing to
    /// follow and yields `Ok(None)`; any other node error is a failure.
    async fn decode(
        &self,
        txid: &str,
        hop: &'static str,
    ) -> Result<Option<DecodedTransaction>, ResolutionError> {
        match self.api.public_transaction(txid).await {
            Ok(tx) => Ok(Some(tx)),
            Err(e) if e.is_not_found() => {
                debug!(txid, hop, error = %e, "Transaction not available to node");
                Ok(None)
            }
            Err(source) => Err(ResolutionError { hop, source }),
        }
    }
}

#[async_trait]
impl SenderResolver for TwoHopSenderResolver {
    async fn resolve_sender(&self, txid: &str) -> Result<SenderCandidate, ResolutionError> {
        let Some(payment) = self.decode(txid, "payment").await? else {
            return Ok(SenderCandidate::unresolved());
        };

        let Some(input) = payment.vin.first() else {
            debug!(txid, "Payment has no inputs");
            return Ok(SenderCandidate::unresolved());
        };

        let (Some(prev_txid), Some(prev_vout)) = (input.txid.as_deref(), input.vout) else {
            debug!(txid, coinbase = input.coinbase.is_some(), "First input spends nothing");
            return Ok(SenderCandidate::unresolved());
        };

        let Some(funding) = self.decode(prev_txid, "funding").await? else {
            return Ok(SenderCandidate::unresolved());
        };

        let Some(output) = funding.vout.iter().find(|out| out.n == prev_vout) else {
            debug!(
                txid,
                prev_txid,
                prev_vout,
                "Funding transaction has no such output"
            );
            return Ok(SenderCandidate::unresolved());
        };

        match output.script_pub_key.addresses.first() {
            Some(address) => {
                debug!(txid, sender = %address, "Resolved sender");
                Ok(SenderCandidate::resolved(address.clone()))
            }
            None => {
                debug!(txid, prev_txid, prev_vout, "Funding output has no address");
                Ok(SenderCandidate::unresolved())
            }
        }
    }
}
