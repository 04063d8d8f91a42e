// Copyright (c) 2024 The Botho Foundation

//! Reads an incoming wallet transaction into an [`IncomingPayment`].

use asset_bridge_core::{IncomingPayment, PaymentCategory};
use tracing::debug;

use crate::{
    error::{InspectionError, RpcError},
    node::NodeApi,
};

const METHOD: &str = "gettransaction";

/// Looks up wallet transactions and extracts the first detail line.
#[derive(Clone)]
pub struct TransactionInspector {
    api: NodeApi,
}

impl TransactionInspector {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Summarize the transaction's first detail line.
    ///
    /// A transaction the node does not know is [`InspectionError::NotFound`];
    /// one without detail lines is [`InspectionError::NoDetails`], checked
    /// before the numeric fields are required.
    pub async fn inspect(&self, txid: &str) -> Result<IncomingPayment, InspectionError> {
        let tx = match self.api.get_transaction(txid).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                return Err(InspectionError::NotFound {
                    txid: txid.to_string(),
                })
            }
            Err(e) if e.is_not_found() => {
                debug!(txid, error = %e, "Node does not know transaction");
                return Err(InspectionError::NotFound {
                    txid: txid.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let Some(detail) = tx.details.first() else {
            return Err(InspectionError::NoDetails {
                txid: txid.to_string(),
            });
        };

        let category = detail
            .category
            .as_deref()
            .ok_or_else(|| missing("details[0].category"))?;
        let receive_address = detail
            .address
            .clone()
            .ok_or_else(|| missing("details[0].address"))?;
        let amount = tx.amount.ok_or_else(|| missing("amount"))?;
        let confirmations = tx.confirmations.ok_or_else(|| missing("confirmations"))?;

        Ok(IncomingPayment {
            category: PaymentCategory::from_node(category),
            receive_address,
            amount,
            confirmations,
        })
    }
}

fn missing(field: &str) -> RpcError {
    RpcError::protocol(METHOD, format!("missing field `{}`", field))
}
