/// Ticketor
///
/// NFT ticket wallet client: connects a wallet to the Hilbert Hotel Chain,
/// reads the tickets it owns from the TicketorNFT contract and renders them.
mod chain;
mod cli;
mod config;
mod controller;
mod display;
mod error;
mod gateway;
mod models;
mod pipeline;
mod rpc;
mod transform;
mod wallet;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::{AppConfig, WalletKind};
use controller::{ConnectionController, SessionOutcome};
use gateway::{ContractGateway, MockTicketContract, TicketContract};
use models::SessionStatus;
use rpc::JsonRpcClient;
use wallet::{ConnectorWallet, DirectWallet, MockWallet, WalletProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    cli.validate().context("Invalid command-line arguments")?;
    let config = AppConfig::resolve(&cli).context("Invalid configuration")?;

    println!("🎟️  Starting Ticketor...");
    println!("🔗 Chain: {} ({}) via {}", config.chain.name, config.chain.chain_id_hex(), config.chain.rpc_url);
    println!("📜 Contract: {}", config.contract);
    println!("👛 Wallet: {:?}", config.wallet);
    println!("🕒 Ticket times: UTC{}", config.clock.offset());

    if config.wallet != WalletKind::Mock {
        probe_chain(&config).await;
    }

    // The mock wallet outlives reloads, like a browser extension outlives the page.
    let demo_wallet = MockWallet::new(config.account.into_iter().collect(), config.chain.chain_id);

    let mut reloads = 0u32;
    loop {
        match run_session(&config, &demo_wallet).await? {
            SessionOutcome::Shutdown => break,
            SessionOutcome::ReloadRequested { chain_id } => {
                reloads += 1;
                println!("\n🔄 Wallet moved to chain {}, reloading (#{})...", chain_id, reloads);
            }
        }
    }

    println!("\n👋 Ticketor stopped");
    Ok(())
}

/// Run one controller session until shutdown, Ctrl-C or a reload request
async fn run_session(config: &AppConfig, demo_wallet: &MockWallet) -> Result<SessionOutcome> {
    let (wallet, gateway) = build_bindings(config, demo_wallet).context("Failed to set up wallet session")?;
    tracing::info!("Session using {} wallet against {}", wallet.kind(), gateway.contract_address());

    let (controller, handle) = ConnectionController::new(Arc::clone(&config.chain), wallet, gateway, config.clock);
    let session = tokio::spawn(controller.run());
    let mut snapshots = handle.subscribe();
    let mut transitions = handle.transitions();
    handle.connect().context("Connection controller stopped before connecting")?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if config.json {
                    println!("{}", serde_json::to_string(&snapshot).context("Failed to serialize snapshot")?);
                } else {
                    println!("\n{}", display::render_snapshot(&snapshot));
                }

                if config.once && snapshot.is_settled() {
                    handle.shutdown();
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n⏹️  Interrupted");
                handle.shutdown();
                break;
            }
        }
    }

    let outcome = session.await.context("Connection controller task failed")?;
    let mut path = Vec::new();
    while let Ok(status) = transitions.try_recv() {
        path.push(status.as_str().to_owned());
    }
    tracing::debug!("Session path: {}", path.join(" -> "));

    let last = handle.snapshot();
    if config.once && outcome == SessionOutcome::Shutdown && last.status == SessionStatus::Error {
        anyhow::bail!("Session ended in error: {}", last.error_message.unwrap_or_default());
    }
    Ok(outcome)
}

fn build_bindings(
    config: &AppConfig,
    demo_wallet: &MockWallet,
) -> Result<(Arc<dyn WalletProvider>, Arc<dyn ContractGateway>)> {
    let chain_rpc = || JsonRpcClient::new(config.chain.rpc_url.clone(), config.http_timeout);

    let bindings: (Arc<dyn WalletProvider>, Arc<dyn ContractGateway>) = match config.wallet {
        WalletKind::Mock => {
            let holder = config.account.context("Mock wallet requires an account")?;
            (Arc::new(demo_wallet.clone()), Arc::new(MockTicketContract::demo(config.contract, holder)))
        }
        WalletKind::Direct => {
            let wallet = DirectWallet::new(config.wallet_url.clone(), config.http_timeout, config.poll_interval)
                .context("Failed to create wallet RPC client")?;
            let gateway = TicketContract::new(chain_rpc().context("Failed to create chain RPC client")?, config.contract);
            (Arc::new(wallet), Arc::new(gateway))
        }
        WalletKind::Connector => {
            let wallet_rpc = chain_rpc().context("Failed to create chain RPC client")?;
            let wallet = ConnectorWallet::new(config.account, config.chain.chain_id, Arc::new(wallet_rpc));
            let gateway = TicketContract::new(chain_rpc().context("Failed to create chain RPC client")?, config.contract);
            (Arc::new(wallet), Arc::new(gateway))
        }
    };
    Ok(bindings)
}

/// Check the chain endpoint once at startup. Failures are reported, not fatal:
/// the session surfaces them per call.
async fn probe_chain(config: &AppConfig) {
    let rpc = match JsonRpcClient::new(config.chain.rpc_url.clone(), config.http_timeout) {
        Ok(rpc) => rpc,
        Err(e) => {
            tracing::warn!("Cannot build chain RPC client: {}", e);
            return;
        }
    };

    match rpc.chain_id().await {
        Ok(chain_id) if chain_id == config.chain.chain_id => println!("✅ Connected to: {}", rpc.endpoint()),
        Ok(chain_id) => {
            tracing::warn!("{} serves chain {}, expected {}", rpc.endpoint(), chain_id, config.chain.chain_id)
        }
        Err(e) => tracing::warn!("Chain endpoint {} unreachable: {}", rpc.endpoint(), e),
    }
}
