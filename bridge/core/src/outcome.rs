// Copyright (c) 2024 The Botho Foundation

//! Exchange outcomes and the exchange state machine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payment::PaymentCategory;

/// The stage an exchange run is in.
///
/// Runs only move forward. A failure at any stage ends the run with a
/// `Rejected` or `Failed` outcome instead of moving to the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStage {
    /// Fetching the in-wallet transaction record
    Inspecting,
    /// Applying the payment rules
    Validating,
    /// Walking back to the probable sender
    ResolvingSender,
    /// Asking the node whether the sender address is valid
    ValidatingAddress,
    /// Reading the wallet's asset balance
    CheckingBalance,
    /// Sending the asset
    Dispatching,
    /// Asset sent
    Done,
}

impl ExchangeStage {
    /// Get the next stage in the flow.
    pub fn next(&self) -> Option<ExchangeStage> {
        match self {
            ExchangeStage::Inspecting => Some(ExchangeStage::Validating),
            ExchangeStage::Validating => Some(ExchangeStage::ResolvingSender),
            ExchangeStage::ResolvingSender => Some(ExchangeStage::ValidatingAddress),
            ExchangeStage::ValidatingAddress => Some(ExchangeStage::CheckingBalance),
            ExchangeStage::CheckingBalance => Some(ExchangeStage::Dispatching),
            ExchangeStage::Dispatching => Some(ExchangeStage::Done),
            ExchangeStage::Done => None,
        }
    }

    /// Check if this is the final stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeStage::Done)
    }
}

impl std::fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeStage::Inspecting => write!(f, "inspecting"),
            ExchangeStage::Validating => write!(f, "validating"),
            ExchangeStage::ResolvingSender => write!(f, "resolving_sender"),
            ExchangeStage::ValidatingAddress => write!(f, "validating_address"),
            ExchangeStage::CheckingBalance => write!(f, "checking_balance"),
            ExchangeStage::Dispatching => write!(f, "dispatching"),
            ExchangeStage::Done => write!(f, "done"),
        }
    }
}

/// Why a payment was not exchanged.
///
/// These are expected business outcomes, not faults. Each carries the values
/// that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The wallet record has no detail entries (fee or asset-only transaction)
    NoDetails { txid: String },

    /// The payment is not an incoming one
    NotAReceive { category: PaymentCategory },

    /// The payment went to an address we are not watching
    AddressMismatch { expected: String, actual: String },

    /// Less than one whole native unit was received
    BelowMinimumAmount { amount: Decimal },

    /// The payment is not buried deep enough yet
    InsufficientConfirmations { required: u32, actual: i64 },

    /// No previous output could be found for the first input
    SenderUnresolved { txid: String },

    /// The node does not recognize the resolved sender address
    InvalidSenderAddress { address: String },

    /// The wallet holds less of the asset than the payment is owed
    InsufficientAsset {
        asset: String,
        required: u64,
        available: u64,
    },

    /// The ledger already holds a claim for this transaction
    AlreadyProcessed {
        txid: String,
        /// Transfer made by the earlier run, if it got that far
        transfer_txid: Option<String>,
    },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::NoDetails { txid } => write!(
                f,
                "transaction {} has no details, likely a fee or asset transfer transaction",
                txid
            ),
            RejectionReason::NotAReceive { category } => {
                write!(f, "not an incoming payment (category: {})", category)
            }
            RejectionReason::AddressMismatch { expected, actual } => write!(
                f,
                "payment went to {} instead of {}",
                actual, expected
            ),
            RejectionReason::BelowMinimumAmount { amount } => {
                write!(f, "amount {} is below one whole unit", amount)
            }
            RejectionReason::InsufficientConfirmations { required, actual } => write!(
                f,
                "{} confirmations, {} required",
                actual, required
            ),
            RejectionReason::SenderUnresolved { txid } => {
                write!(f, "could not find sender address for {}", txid)
            }
            RejectionReason::InvalidSenderAddress { address } => {
                write!(f, "invalid sender address {}", address)
            }
            RejectionReason::InsufficientAsset {
                asset,
                required,
                available,
            } => write!(
                f,
                "not enough {} left in wallet: {} required, {} available",
                asset, required, available
            ),
            RejectionReason::AlreadyProcessed {
                txid,
                transfer_txid: Some(transfer_txid),
            } => write!(
                f,
                "transaction {} already exchanged in {}",
                txid, transfer_txid
            ),
            RejectionReason::AlreadyProcessed {
                txid,
                transfer_txid: None,
            } => write!(f, "transaction {} was already claimed by another run", txid),
        }
    }
}

/// Result of one exchange run. Exactly one is produced per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExchangeOutcome {
    /// The asset was sent
    Dispatched {
        transfer_txid: String,
        confirmations: i64,
    },

    /// The payment did not qualify
    Rejected { reason: RejectionReason },

    /// A node call failed or answered with something unexpected
    Failed { cause: String },
}

impl ExchangeOutcome {
    /// Create a rejected outcome.
    pub fn rejected(reason: RejectionReason) -> Self {
        ExchangeOutcome::Rejected { reason }
    }

    /// Create a failed outcome.
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        ExchangeOutcome::Failed {
            cause: cause.to_string(),
        }
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self, ExchangeOutcome::Dispatched { .. })
    }

    /// Transaction id of the asset transfer, if one was sent.
    pub fn transfer_txid(&self) -> Option<&str> {
        match self {
            ExchangeOutcome::Dispatched { transfer_txid, .. } => Some(transfer_txid),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExchangeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeOutcome::Dispatched {
                transfer_txid,
                confirmations,
            } => write!(
                f,
                "dispatched in {} ({} confirmations)",
                transfer_txid, confirmations
            ),
            ExchangeOutcome::Rejected { reason } => write!(f, "rejected: {}", reason),
            ExchangeOutcome::Failed { cause } => write!(f, "failed: {}", cause),
        }
    }
}
