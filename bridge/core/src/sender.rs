// Copyright (c) 2024 The Botho Foundation

//! Sender address candidates.

use serde::{Deserialize, Serialize};

/// Best guess at who paid us.
///
/// Produced by walking one hop back through the transaction graph. This is a
/// heuristic and never an authoritative identity: it assumes the first input
/// of the payment spends an output that belonged to the payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderCandidate {
    /// Probable sender address; empty when unresolved
    pub address: String,

    /// Whether a previous output was actually found
    pub resolved: bool,
}

impl SenderCandidate {
    pub fn resolved(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            resolved: true,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            address: String::new(),
            resolved: false,
        }
    }
}
