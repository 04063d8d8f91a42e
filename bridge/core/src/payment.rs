// Copyright (c) 2024 The Botho Foundation

//! Normalized facts about an incoming wallet payment.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wallet category of a transaction detail entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCategory {
    /// Funds leaving the wallet
    Send,
    /// Funds arriving at a wallet address
    Receive,
    /// Anything else the node reports (generate, immature, orphan, ...)
    #[serde(other)]
    Other,
}

impl PaymentCategory {
    /// Map a node category string onto a payment category.
    pub fn from_node(category: &str) -> Self {
        match category {
            "send" => PaymentCategory::Send,
            "receive" => PaymentCategory::Receive,
            _ => PaymentCategory::Other,
        }
    }
}

impl std::fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentCategory::Send => write!(f, "send"),
            PaymentCategory::Receive => write!(f, "receive"),
            PaymentCategory::Other => write!(f, "other"),
        }
    }
}

/// Payment facts extracted from an in-wallet transaction record.
///
/// Only lives for the duration of one exchange run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingPayment {
    /// Category of the first detail entry
    pub category: PaymentCategory,

    /// Address of the first detail entry
    pub receive_address: String,

    /// Top-level amount of the record, in whole native units
    pub amount: Decimal,

    /// Confirmations reported by the node (-1 for conflicted records)
    pub confirmations: i64,
}
