/// Config Module
///
/// Resolves the command line (with its environment fallbacks) into one
/// validated `AppConfig`. Everything here is decided once at startup.
use std::{sync::Arc, time::Duration};

use clap::ValueEnum;

use crate::{
    chain::ChainSpec,
    cli::Cli,
    error::ConfigError,
    gateway::DEFAULT_CONTRACT_ADDRESS,
    models::WalletAddress,
    transform::TicketClock,
};

/// Account the mock wallet exposes when none is configured
pub const DEMO_ACCOUNT: &str = "0x71c7656ec7ab88b098defb751b7401b5f6d8976f";

/// Which wallet provider variant to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WalletKind {
    /// In-memory wallet serving the demo ticket set
    Mock,
    /// EIP-1193 JSON-RPC wallet endpoint
    Direct,
    /// Account handed over by an external wallet connector
    Connector,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chain: Arc<ChainSpec>,
    pub contract: WalletAddress,
    pub wallet: WalletKind,
    pub wallet_url: Option<String>,
    pub account: Option<WalletAddress>,
    pub clock: TicketClock,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub once: bool,
    pub json: bool,
}

impl AppConfig {
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut chain = ChainSpec::hilbert_hotel();
        if let Some(rpc_url) = &cli.rpc_url {
            chain.rpc_url = rpc_url.clone();
        }
        if let Some(chain_id) = cli.chain_id {
            chain.chain_id = chain_id;
        }
        if let Some(name) = &cli.chain_name {
            chain.name = name.clone();
        }
        if let Some(explorer) = &cli.explorer_url {
            // An empty value removes the explorer from the add-chain payload.
            chain.explorer_url = Some(explorer.clone()).filter(|url| !url.is_empty());
        }
        chain.validate()?;

        let contract = WalletAddress::parse(cli.contract.as_deref().unwrap_or(DEFAULT_CONTRACT_ADDRESS))?;
        let account = match (cli.account.as_deref(), cli.wallet) {
            (Some(raw), _) => Some(WalletAddress::parse(raw)?),
            (None, WalletKind::Mock) => Some(WalletAddress::parse(DEMO_ACCOUNT)?),
            (None, _) => None,
        };

        Ok(Self {
            chain: Arc::new(chain),
            contract,
            wallet: cli.wallet,
            wallet_url: cli.wallet_url.clone().filter(|url| !url.is_empty()),
            account,
            clock: TicketClock::from_offset_minutes(cli.utc_offset)?,
            http_timeout: Duration::from_secs(cli.http_timeout),
            poll_interval: Duration::from_secs(cli.poll_interval),
            once: cli.once,
            json: cli.json,
        })
    }
}
