/// Error Module
///
/// Typed errors for every layer of the client. Per-ticket failures
/// (`GatewayError`, `NormalizeError`) stay scoped to the ticket that produced
/// them; only `WalletError` and chain reconciliation failures ever reach the
/// session's error message.
use thiserror::Error;

/// Message shown when no wallet provider is installed or configured.
pub const PROVIDER_MISSING_MESSAGE: &str = "Wallet extension not found. Please install a wallet to use this app.";

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code returned by `wallet_switchEthereumChain` for an unknown chain.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// JSON-RPC transport failures
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    Malformed(String),
}

/// Failures of the read-only ticket contract calls
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure; retryable, scoped to the single call
    #[error("network error: {0}")]
    Network(String),

    /// The call reverted or returned data that does not decode
    #[error("contract error: {0}")]
    Contract(String),
}

impl From<RpcError> for GatewayError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Rpc { code, message } => GatewayError::Contract(format!("call reverted ({code}): {message}")),
            other => GatewayError::Network(other.to_string()),
        }
    }
}

impl From<alloy_sol_types::Error> for GatewayError {
    fn from(err: alloy_sol_types::Error) -> Self {
        GatewayError::Contract(format!("malformed return data: {err}"))
    }
}

/// Failures reported by a wallet provider
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet provider not found")]
    ProviderMissing,

    #[error("request rejected by the user")]
    UserRejected,

    #[error("chain {0} is not known to the wallet")]
    UnrecognizedChain(u64),

    #[error("wallet returned an invalid account: {0}")]
    InvalidAccount(String),

    #[error("wallet error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("wallet transport error: {0}")]
    Transport(String),
}

impl WalletError {
    /// Map a JSON-RPC failure from an EIP-1193 endpoint onto the wallet taxonomy.
    pub fn from_rpc(err: RpcError, requested_chain: Option<u64>) -> Self {
        match err {
            RpcError::Rpc { code: USER_REJECTED_CODE, .. } => WalletError::UserRejected,
            RpcError::Rpc { code: UNRECOGNIZED_CHAIN_CODE, message } => match requested_chain {
                Some(chain_id) => WalletError::UnrecognizedChain(chain_id),
                None => WalletError::Rpc { code: UNRECOGNIZED_CHAIN_CODE, message },
            },
            RpcError::Rpc { code, message } => WalletError::Rpc { code, message },
            other => WalletError::Transport(other.to_string()),
        }
    }
}

/// Failures turning one raw contract record into a ticket
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("ticket detail unavailable: {0}")]
    Detail(GatewayError),

    #[error("qr payload unavailable: {0}")]
    QrPayload(GatewayError),

    #[error("invalid timestamp {0}")]
    Timestamp(String),
}

/// Startup configuration faults
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid address '{0}': expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    #[error("invalid token id '{0}': expected an unsigned decimal integer")]
    InvalidTokenId(String),

    #[error("invalid chain spec: {0}")]
    InvalidChain(String),

    #[error("invalid UTC offset of {0} minutes")]
    InvalidOffset(i32),
}

/// The controller task has stopped and no longer accepts intents
#[derive(Debug, Error)]
#[error("connection controller is no longer running")]
pub struct ControllerClosed;
