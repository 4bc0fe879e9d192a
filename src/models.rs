/// Data Models Module
///
/// This module defines the core data structures used throughout the application:
/// on-chain identifiers, raw contract records, canonical tickets, and the
/// immutable session snapshot handed to the presentation layer.
use std::{fmt, str::FromStr, sync::Arc};

use alloy_primitives::{hex, Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::ConfigError;

/// A 20-byte account or contract address, canonically rendered in lowercase hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress(Address);

impl WalletAddress {
    /// Parse a case-insensitive `0x`-prefixed address. Checksums are not enforced.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ConfigError::InvalidAddress(raw.to_string()))?;
        if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidAddress(raw.to_string()));
        }
        let bytes = hex::decode(body).map_err(|_| ConfigError::InvalidAddress(raw.to_string()))?;
        Ok(Self(Address::from_slice(&bytes)))
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for WalletAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl FromStr for WalletAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

impl Serialize for WalletAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// On-chain token id. Rendered as an exact decimal string, never as a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(pub U256);

impl TicketId {
    pub fn from_u64(id: u64) -> Self {
        Self(U256::from(id))
    }
}

impl FromStr for TicketId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidTokenId(s.to_string()));
        }
        U256::from_str_radix(s, 10).map(Self).map_err(|_| ConfigError::InvalidTokenId(s.to_string()))
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `TicketView` record exactly as the contract returns it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTicket {
    pub event_id: U256,
    pub event_name: String,
    pub seat_info: String,
    pub event_date_unix: U256,
    pub qr_hash: B256,
    pub redeemed: bool,
    pub redeemed_at_unix: U256,
    pub redeemed_by: WalletAddress,
    pub current_owner: WalletAddress,
}

/// Canonical, display-ready ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub token_id: String,
    pub event_name: String,
    pub event_date: String,
    pub event_time: String,
    pub venue: String,
    pub category_name: String,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    pub is_redeemed: bool,
    pub redeemed_date: Option<String>,
    pub qr_code_string: String,
}

/// Tickets of one completed load cycle, in the order the contract listed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketCollection(Arc<Vec<Ticket>>);

impl Serialize for TicketCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl TicketCollection {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self(Arc::new(tickets))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn redeemed_count(&self) -> usize {
        self.0.iter().filter(|t| t.is_redeemed).count()
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|t| !t.is_redeemed).count()
    }
}

/// Wallet connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
    WrongNetwork,
    SwitchingNetwork,
    Error,
}

impl SessionStatus {
    /// States in which the session exposes an account address
    pub fn holds_address(&self) -> bool {
        matches!(self, Self::Connected | Self::WrongNetwork | Self::SwitchingNetwork)
    }

    /// States from which a `connect()` intent starts a new attempt
    pub fn accepts_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::SwitchingNetwork)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::WrongNetwork => "Wrong Network",
            Self::SwitchingNetwork => "Switching Network",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable view of the session, re-published on every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub revision: u64,
    pub status: SessionStatus,
    pub address: Option<String>,
    pub shortened_address: Option<String>,
    pub network_name: String,
    pub is_loading: bool,
    pub tickets: TicketCollection,
    pub redeemed_count: usize,
    pub active_count: usize,
    pub error_message: Option<String>,
    pub contract_address: String,
    pub shortened_contract: String,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }

    /// Whether a connection attempt has run to a resting state: tickets loaded,
    /// an error, or back to Disconnected after at least one transition
    pub fn is_settled(&self) -> bool {
        match self.status {
            SessionStatus::Connected => !self.is_loading && self.loaded_at.is_some(),
            SessionStatus::Error => true,
            SessionStatus::Disconnected => self.revision > 0,
            _ => false,
        }
    }
}

/// First 6 + "..." + last 4 characters, for values longer than 10 characters
pub fn shorten(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
