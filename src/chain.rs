/// Chain Module
///
/// Static description of the one network this client supports. A `ChainSpec`
/// is built once at startup, validated, and shared read-only as `Arc<ChainSpec>`.
use serde::Serialize;

use crate::error::ConfigError;

pub const DEFAULT_CHAIN_ID: u64 = 18504;
pub const DEFAULT_CHAIN_NAME: &str = "Hilbert Hotel Chain";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_EXPLORER_URL: &str = "http://localhost:3000";

/// Native currency of the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The required network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub native_currency: NativeCurrency,
}

/// Payload of `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Option<Vec<String>>,
}

impl ChainSpec {
    /// The Hilbert Hotel Chain as deployed for Ticketor
    pub fn hilbert_hotel() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            name: DEFAULT_CHAIN_NAME.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            explorer_url: Some(DEFAULT_EXPLORER_URL.to_string()),
            native_currency: NativeCurrency { name: "Argentos".to_string(), symbol: "ARGO".to_string(), decimals: 18 },
        }
    }

    /// Chain id as the `0x`-prefixed quantity wallets expect
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.name.clone(),
            native_currency: self.native_currency.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: self.explorer_url.as_ref().map(|url| vec![url.clone()]),
        }
    }

    /// Reject specs that could never be served. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidChain("chain id must be non-zero".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidChain("chain name must not be empty".to_string()));
        }
        if !is_http_url(&self.rpc_url) {
            return Err(ConfigError::InvalidChain(format!("rpc url '{}' is not an http(s) url", self.rpc_url)));
        }
        if let Some(explorer) = &self.explorer_url {
            if !is_http_url(explorer) {
                return Err(ConfigError::InvalidChain(format!("explorer url '{}' is not an http(s) url", explorer)));
            }
        }
        if self.native_currency.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidChain("currency symbol must not be empty".to_string()));
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Parse an `eth_chainId` style quantity (`0x4848`) or a plain decimal id.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hilbert_hotel_defaults() {
        let chain = ChainSpec::hilbert_hotel();
        assert_eq!(chain.chain_id_hex(), "0x4848");
        assert_eq!(chain.native_currency.symbol, "ARGO");
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_add_chain_params_shape() {
        let params = serde_json::to_value(ChainSpec::hilbert_hotel().add_chain_params()).unwrap();
        assert_eq!(params["chainId"], "0x4848");
        assert_eq!(params["chainName"], "Hilbert Hotel Chain");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(params["rpcUrls"][0], "http://127.0.0.1:8545");
        assert_eq!(params["blockExplorerUrls"][0], "http://localhost:3000");
    }

    #[test]
    fn test_validation() {
        let mut chain = ChainSpec::hilbert_hotel();
        chain.chain_id = 0;
        assert!(chain.validate().is_err());

        let mut chain = ChainSpec::hilbert_hotel();
        chain.rpc_url = "ws://127.0.0.1:8546".to_string();
        assert!(chain.validate().is_err());
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("0x4848"), Some(18504));
        assert_eq!(parse_chain_id("18504"), Some(18504));
        assert_eq!(parse_chain_id("0x1"), Some(1));
        assert_eq!(parse_chain_id("hilbert"), None);
    }
}
