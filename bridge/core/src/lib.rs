// Copyright (c) 2024 The Botho Foundation

//! Core types and logic for the asset bridge.
//!
//! This crate holds everything about an exchange that does not need a node
//! connection:
//!
//! - Bridge configuration and the per-run exchange policy
//! - Normalized payment facts and the validation gate
//! - Exchange quantity computation
//! - Outcomes, rejection reasons and the exchange state machine

pub mod config;
pub mod outcome;
pub mod payment;
pub mod policy;
pub mod sender;

pub use config::{BridgeConfig, ConfigError, ExchangeSettings, LedgerSettings, NodeConfig};
pub use outcome::{ExchangeOutcome, ExchangeStage, RejectionReason};
pub use payment::{IncomingPayment, PaymentCategory};
pub use policy::{exchange_quantity, ExchangePolicy};
pub use sender::SenderCandidate;
