// Copyright (c) 2024 The Botho Foundation

//! Address validation against the node.

use tracing::debug;

use crate::{error::RpcError, node::NodeApi};

#[derive(Clone)]
pub struct AddressValidator {
    api: NodeApi,
}

impl AddressValidator {
    pub fn new(api: NodeApi) -> Self {
        Self { api }
    }

    /// Whether the node accepts `address` as a valid address on its network.
    pub async fn is_valid(&self, address: &str) -> Result<bool, RpcError> {
        if address.is_empty() {
            return Ok(false);
        }
        let validation = self.api.validate_address(address).await?;
        debug!(address, valid = validation.isvalid, "Validated address");
        Ok(validation.isvalid)
    }
}
