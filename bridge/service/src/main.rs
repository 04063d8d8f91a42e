// Copyright (c) 2024 The Botho Foundation

//! Asset Bridge CLI
//!
//! Meant to be run from the node's `walletnotify` hook with the id of each
//! new wallet transaction; also exposes the individual node lookups.

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{bail, Context, Result};
use asset_bridge::{
    AssetDispatcher, Database, DispatchLocks, ExchangeOrchestrator, NodeApi, NodeClient,
    ProcessedLedger, SenderResolver, TwoHopSenderResolver,
};
use asset_bridge_core::{BridgeConfig, ExchangeOutcome};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "asset-bridge")]
#[command(about = "Exchanges incoming payments for assets")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "bridge.toml")]
    config: PathBuf,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the exchange workflow for an incoming transaction
    Exchange {
        txid: String,

        /// Override the configured confirmation threshold
        #[arg(long)]
        min_confirmations: Option<u32>,

        /// Override the configured multiplier
        #[arg(long)]
        multiplier: Option<u32>,
    },

    /// Print the in-wallet transaction record
    Tx { txid: String },

    /// Print a decoded transaction, wallet or not
    PublicTx { txid: String },

    /// Print the resolved sender candidate of a transaction
    Sender { txid: String },

    /// Print the confirmations of output 0 of a transaction
    Confirmations { txid: String },

    /// Print asset metadata
    AssetData { asset: String },

    /// Send an asset manually
    Transfer {
        asset: String,
        quantity: u64,
        address: String,
    },

    /// Print blockchain info
    ChainInfo,

    /// Print the current block height
    BlockCount,

    /// Print recent ledger records
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = BridgeConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    let client = NodeClient::new(&config.node).context("Failed to create node client")?;
    info!(url = client.url(), "Using node");
    let gateway = Arc::new(client);
    let api = NodeApi::new(gateway.clone());

    match cli.command {
        Commands::Exchange {
            txid,
            min_confirmations,
            multiplier,
        } => {
            let mut policy = config.policy();
            if let Some(min) = min_confirmations {
                policy.min_confirmations = min;
            }
            if let Some(multiplier) = multiplier {
                policy.multiplier = Some(multiplier);
            }
            if let Err(e) = policy.validate() {
                bail!("Invalid exchange policy: {}", e);
            }

            let mut orchestrator = ExchangeOrchestrator::new(gateway);
            if let Some(db) = open_ledger(&config)? {
                orchestrator = orchestrator.with_ledger(Arc::new(db));
            }
            if config.exchange.serialize_dispatch {
                orchestrator = orchestrator.with_dispatch_locks(DispatchLocks::new());
            }

            let outcome = orchestrator.exchange(&txid, &policy).await;
            print_json(&outcome)?;

            Ok(match outcome {
                ExchangeOutcome::Dispatched { .. } => ExitCode::SUCCESS,
                ExchangeOutcome::Rejected { .. } => ExitCode::from(2),
                ExchangeOutcome::Failed { .. } => ExitCode::FAILURE,
            })
        }
        Commands::Tx { txid } => {
            match api.get_transaction(&txid).await? {
                Some(tx) => print_json(&tx)?,
                None => bail!("Transaction {} not found in wallet", txid),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::PublicTx { txid } => {
            print_json(&api.public_transaction(&txid).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sender { txid } => {
            let resolver = TwoHopSenderResolver::new(api);
            print_json(&resolver.resolve_sender(&txid).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Confirmations { txid } => {
            match api.transaction_confirmations(&txid).await? {
                Some(confirmations) => println!("{}", confirmations),
                None => bail!("Output 0 of {} is spent or unknown", txid),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::AssetData { asset } => {
            match api.get_asset_data(&asset).await? {
                Some(data) => print_json(&data)?,
                None => bail!("Asset {} not found", asset),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Transfer {
            asset,
            quantity,
            address,
        } => {
            let dispatcher = AssetDispatcher::new(api);
            print_json(&dispatcher.dispatch(&asset, quantity, &address).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ChainInfo => {
            print_json(&api.get_blockchain_info().await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::BlockCount => {
            println!("{}", api.get_block_count().await?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::History { limit } => {
            let Some(db) = open_ledger(&config)? else {
                bail!("No ledger configured; set [ledger] db_path");
            };
            for record in db.recent(limit)? {
                print_json(&record)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_ledger(config: &BridgeConfig) -> Result<Option<Database>> {
    match &config.ledger.db_path {
        Some(path) => {
            info!(path = %path, "Opening ledger");
            let db = Database::open(path)
                .with_context(|| format!("Failed to open ledger at {}", path))?;
            Ok(Some(db))
        }
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
