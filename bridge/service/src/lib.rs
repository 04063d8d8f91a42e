// Copyright (c) 2024 The Botho Foundation

//! Asset bridge service.
//!
//! Takes the id of a payment received by the node's wallet and, if the
//! payment qualifies, sends the configured asset back to whoever paid.
//! The node is reached over JSON-RPC through the [`node::RpcGateway`] seam;
//! [`exchange::ExchangeOrchestrator`] drives a single run.

pub mod address;
pub mod assets;
pub mod db;
pub mod error;
pub mod exchange;
pub mod inspector;
pub mod node;
pub mod sender;

pub use address::AddressValidator;
pub use assets::{AssetBalanceChecker, AssetDispatcher, TransferResult};
pub use db::{Database, ProcessedLedger, ProcessedRecord};
pub use error::{
    BalanceError, DispatchError, InspectionError, LedgerError, ResolutionError, RpcError,
};
pub use exchange::{DispatchLocks, ExchangeOrchestrator};
pub use inspector::TransactionInspector;
pub use node::{NodeApi, NodeClient, RpcGateway};
pub use sender::{SenderResolver, TwoHopSenderResolver};
