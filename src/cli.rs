/// CLI Module
///
/// Command-line interface configuration using clap. Every network setting
/// falls back to a `TICKETOR_*` environment variable (loaded from `.env`).
use clap::Parser;

use crate::{chain::parse_chain_id, config::WalletKind};

/// Ticketor - NFT ticket wallet
///
/// Connect a wallet to the Hilbert Hotel Chain and list the event tickets it holds
#[derive(Parser, Debug)]
#[command(name = "ticketor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Wallet provider to connect with
    #[arg(short = 'w', long, value_enum, default_value = "mock")]
    pub wallet: WalletKind,

    /// EIP-1193 JSON-RPC endpoint of the wallet (direct provider only)
    #[arg(long, value_name = "URL", env = "TICKETOR_WALLET_URL")]
    pub wallet_url: Option<String>,

    /// Account to use with the mock or connector provider
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    pub account: Option<String>,

    /// Chain RPC endpoint used for contract reads
    #[arg(short = 'r', long, value_name = "URL", env = "TICKETOR_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Required chain id, decimal or 0x-hex
    #[arg(long, value_name = "ID", env = "TICKETOR_CHAIN_ID", value_parser = parse_chain_arg)]
    pub chain_id: Option<u64>,

    /// Display name of the required chain
    #[arg(long, value_name = "NAME", env = "TICKETOR_CHAIN_NAME")]
    pub chain_name: Option<String>,

    /// Block explorer offered when adding the chain to a wallet (empty for none)
    #[arg(long, value_name = "URL", env = "TICKETOR_EXPLORER_URL")]
    pub explorer_url: Option<String>,

    /// Ticket contract address
    #[arg(short = 'c', long, value_name = "ADDRESS", env = "TICKETOR_CONTRACT_ADDRESS")]
    pub contract: Option<String>,

    /// UTC offset in minutes used to render ticket dates
    #[arg(
        long,
        value_name = "MINUTES",
        env = "TICKETOR_UTC_OFFSET_MINUTES",
        default_value = "0",
        allow_hyphen_values = true
    )]
    pub utc_offset: i32,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECONDS", env = "TICKETOR_HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout: u64,

    /// Interval between wallet polls in seconds (direct provider only)
    #[arg(long, value_name = "SECONDS", default_value = "2")]
    pub poll_interval: u64,

    /// Exit once the first connection attempt has settled
    #[arg(long)]
    pub once: bool,

    /// Print snapshots as JSON lines instead of the ticket view
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.http_timeout == 0 {
            anyhow::bail!("HTTP timeout must be greater than 0");
        }

        if self.poll_interval == 0 {
            anyhow::bail!("Poll interval must be greater than 0");
        }

        if self.utc_offset.abs() >= 24 * 60 {
            anyhow::bail!("UTC offset ({} minutes) must be less than a day", self.utc_offset);
        }

        if self.wallet != WalletKind::Direct && self.wallet_url.is_some() {
            tracing::warn!("--wallet-url is only used by the direct wallet provider");
        }

        Ok(())
    }
}

fn parse_chain_arg(raw: &str) -> Result<u64, String> {
    parse_chain_id(raw).ok_or_else(|| format!("'{}' is not a chain id", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        Cli {
            wallet: WalletKind::Mock,
            wallet_url: None,
            account: None,
            rpc_url: None,
            chain_id: None,
            chain_name: None,
            explorer_url: None,
            contract: None,
            utc_offset: 0,
            http_timeout: 30,
            poll_interval: 2,
            once: false,
            json: false,
        }
    }

    #[test]
    fn test_validation() {
        assert!(cli().validate().is_ok());
        assert!(Cli { http_timeout: 0, ..cli() }.validate().is_err());
        assert!(Cli { poll_interval: 0, ..cli() }.validate().is_err());
        assert!(Cli { utc_offset: -1440, ..cli() }.validate().is_err());
        assert!(Cli { utc_offset: -90, ..cli() }.validate().is_ok());
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["ticketor", "--wallet", "connector", "--chain-id", "0x4848", "--once"]).unwrap();
        assert_eq!(cli.wallet, WalletKind::Connector);
        assert_eq!(cli.chain_id, Some(18504));
        assert!(cli.once);

        assert!(Cli::try_parse_from(["ticketor", "--wallet", "metamask"]).is_err());
        assert!(Cli::try_parse_from(["ticketor", "--chain-id", "hilbert"]).is_err());
    }
}
