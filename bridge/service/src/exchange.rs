// Copyright (c) 2024 The Botho Foundation

//! Exchange orchestration.
//!
//! One run takes an incoming transaction id through the stages in
//! [`ExchangeStage`] order and ends with exactly one [`ExchangeOutcome`]:
//!
//! ```text
//! Inspecting -> Validating -> ResolvingSender -> ValidatingAddress
//!     -> CheckingBalance -> Dispatching -> Done
//! ```
//!
//! Any failure ends the run immediately. Nothing is retried.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use asset_bridge_core::{ExchangeOutcome, ExchangePolicy, ExchangeStage, RejectionReason};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    address::AddressValidator,
    assets::{AssetBalanceChecker, AssetDispatcher},
    db::ProcessedLedger,
    error::{BalanceError, InspectionError},
    inspector::TransactionInspector,
    node::{NodeApi, RpcGateway},
    sender::{SenderResolver, TwoHopSenderResolver},
};

/// Per-asset locks serializing balance check and dispatch within a process.
#[derive(Clone, Default)]
pub struct DispatchLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl DispatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `asset`.
    pub async fn lock(&self, asset: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(asset.to_string()).or_default().clone()
        };
        mutex.lock_owned().await
    }
}

/// Runs exchanges against one node.
pub struct ExchangeOrchestrator {
    inspector: TransactionInspector,
    resolver: Arc<dyn SenderResolver>,
    addresses: AddressValidator,
    balances: AssetBalanceChecker,
    dispatcher: AssetDispatcher,
    ledger: Option<Arc<dyn ProcessedLedger>>,
    locks: Option<DispatchLocks>,
}

impl ExchangeOrchestrator {
    /// Create an orchestrator with the two-hop sender resolver, no ledger and
    /// no dispatch serialization.
    pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
        let api = NodeApi::new(gateway);
        Self {
            inspector: TransactionInspector::new(api.clone()),
            resolver: Arc::new(TwoHopSenderResolver::new(api.clone())),
            addresses: AddressValidator::new(api.clone()),
            balances: AssetBalanceChecker::new(api.clone()),
            dispatcher: AssetDispatcher::new(api),
            ledger: None,
            locks: None,
        }
    }

    pub fn with_sender_resolver(mut self, resolver: Arc<dyn SenderResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Claim each transaction in `ledger` before dispatching for it.
    pub fn with_ledger(mut self, ledger: Arc<dyn ProcessedLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Hold a per-asset lock from the balance check through the dispatch.
    pub fn with_dispatch_locks(mut self, locks: DispatchLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Run one exchange for the incoming transaction `txid`.
    pub async fn exchange(&self, txid: &str, policy: &ExchangePolicy) -> ExchangeOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("exchange", %run_id, txid, asset = %policy.asset_name);

        async move {
            let outcome = match self.run(run_id, txid, policy).await {
                Ok(outcome) | Err(outcome) => outcome,
            };

            match &outcome {
                ExchangeOutcome::Dispatched { .. } => info!(%outcome, "Exchange complete"),
                ExchangeOutcome::Rejected { .. } => warn!(%outcome, "Exchange rejected"),
                ExchangeOutcome::Failed { .. } => error!(%outcome, "Exchange failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// The stages of a run. `Err` carries an early terminal outcome.
    async fn run(
        &self,
        run_id: Uuid,
        txid: &str,
        policy: &ExchangePolicy,
    ) -> Result<ExchangeOutcome, ExchangeOutcome> {
        let mut stage = ExchangeStage::Inspecting;
        debug!(%stage, "Starting exchange");

        policy
            .validate()
            .map_err(|e| failed(stage, format!("invalid exchange policy: {}", e)))?;

        let payment = self.inspector.inspect(txid).await.map_err(|e| match e {
            InspectionError::NoDetails { txid } => {
                ExchangeOutcome::rejected(RejectionReason::NoDetails { txid })
            }
            other => failed(stage, other),
        })?;
        debug!(
            category = %payment.category,
            address = %payment.receive_address,
            amount = %payment.amount,
            confirmations = payment.confirmations,
            "Inspected payment"
        );

        stage = advance(stage);
        let quantity = policy.check(&payment).map_err(ExchangeOutcome::rejected)?;
        debug!(quantity, multiplier = policy.multiplier(), "Payment accepted");

        stage = advance(stage);
        let sender = self
            .resolver
            .resolve_sender(txid)
            .await
            .map_err(|e| failed(stage, e))?;
        if !sender.resolved {
            return Err(ExchangeOutcome::rejected(
                RejectionReason::SenderUnresolved {
                    txid: txid.to_string(),
                },
            ));
        }

        stage = advance(stage);
        let valid = self
            .addresses
            .is_valid(&sender.address)
            .await
            .map_err(|e| failed(stage, e))?;
        if !valid {
            return Err(ExchangeOutcome::rejected(
                RejectionReason::InvalidSenderAddress {
                    address: sender.address,
                },
            ));
        }

        stage = advance(stage);
        let _guard = match &self.locks {
            Some(locks) => Some(locks.lock(&policy.asset_name).await),
            None => None,
        };

        let available = match self.balances.check_balance(&policy.asset_name).await {
            Ok(balance) => balance,
            Err(BalanceError::NotFound { .. }) => 0,
            Err(e) => return Err(failed(stage, e)),
        };
        if available < quantity {
            return Err(ExchangeOutcome::rejected(
                RejectionReason::InsufficientAsset {
                    asset: policy.asset_name.clone(),
                    required: quantity,
                    available,
                },
            ));
        }

        stage = advance(stage);
        if let Some(ledger) = &self.ledger {
            match ledger.claim(txid, &run_id) {
                Ok(None) => {}
                Ok(Some(record)) => {
                    debug!(claimed_by = %record.run_id, "Transaction already claimed");
                    return Err(ExchangeOutcome::rejected(
                        RejectionReason::AlreadyProcessed {
                            txid: txid.to_string(),
                            transfer_txid: record
                                .outcome
                                .as_ref()
                                .and_then(ExchangeOutcome::transfer_txid)
                                .map(str::to_string),
                        },
                    ));
                }
                Err(e) => return Err(failed(stage, e)),
            }
        }

        let outcome = match self
            .dispatcher
            .dispatch(&policy.asset_name, quantity, &sender.address)
            .await
        {
            Ok(transfer) => {
                stage = advance(stage);
                debug!(
                    %stage,
                    terminal = stage.is_terminal(),
                    transfer_txid = %transfer.txid,
                    "Transfer dispatched"
                );
                ExchangeOutcome::Dispatched {
                    transfer_txid: transfer.txid,
                    confirmations: payment.confirmations,
                }
            }
            Err(e) => failed(stage, e),
        };

        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger.complete(txid, &outcome) {
                error!(error = %e, "Failed to record exchange outcome");
            }
        }

        Ok(outcome)
    }
}

fn advance(stage: ExchangeStage) -> ExchangeStage {
    let next = stage.next().unwrap_or(stage);
    debug!(from = %stage, to = %next, "Stage transition");
    next
}

fn failed(stage: ExchangeStage, err: impl std::fmt::Display) -> ExchangeOutcome {
    debug!(%stage, error = %err, "Stage failed");
    ExchangeOutcome::failed(err)
}
