/// Wallet Module
///
/// The `WalletProvider` trait is the injected capability the connection
/// controller drives. Three variants exist, selected once at startup:
/// an in-memory mock, a direct EIP-1193 JSON-RPC endpoint, and a
/// connector-managed account.
pub mod connector;
pub mod direct;
pub mod mock;

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{chain::ChainSpec, error::WalletError, models::WalletAddress};

pub use connector::ConnectorWallet;
pub use direct::DirectWallet;
pub use mock::MockWallet;

/// Notifications pushed by the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The exposed accounts changed; empty means the wallet disconnected
    AccountsChanged(Vec<WalletAddress>),
    ChainChanged(u64),
}

pub type SubscriptionId = u64;

/// A live listener registration. Dropping the receiver does not unregister it;
/// call `WalletProvider::unsubscribe`.
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<WalletEvent>,
}

pub trait WalletProvider: Send + Sync {
    /// Short label for logs
    fn kind(&self) -> &'static str;

    /// Whether a provider is installed or configured at all
    fn is_available(&self) -> bool;

    /// Ask the user to expose accounts. Empty means nothing was shared.
    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<WalletAddress>, WalletError>>;

    /// The chain the wallet is currently on
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>>;

    fn request_chain_switch(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>>;

    fn request_add_chain<'a>(&'a self, chain: &'a ChainSpec) -> BoxFuture<'a, Result<(), WalletError>>;

    fn subscribe(&self) -> Subscription;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Fan-out of wallet events to registered listeners
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<WalletEvent>>>,
}

impl EventHub {
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().insert(id, tx);
        Subscription { id, events: rx }
    }

    /// Returns whether the id was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }

    /// Deliver to every listener, pruning those whose receiver is gone
    pub fn emit(&self, event: WalletEvent) {
        let mut listeners = self.listeners.lock();
        listeners.retain(|id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                tracing::debug!("Dropping closed wallet listener {}", id);
            }
            delivered
        });
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Parse the account list of an `eth_requestAccounts` / `eth_accounts` reply
pub fn parse_accounts(raw: &[String]) -> Result<Vec<WalletAddress>, WalletError> {
    raw.iter()
        .map(|account| WalletAddress::parse(account).map_err(|_| WalletError::InvalidAccount(account.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";

    #[test]
    fn test_parse_accounts_lowercases() {
        let accounts = parse_accounts(&[ACCOUNT.to_string()]).unwrap();
        assert_eq!(accounts[0].to_string(), ACCOUNT.to_lowercase());
        assert!(parse_accounts(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_accounts_rejects_garbage() {
        let result = parse_accounts(&[ACCOUNT.to_string(), "not-an-address".to_string()]);
        assert!(matches!(result, Err(WalletError::InvalidAccount(ref raw)) if raw == "not-an-address"));
    }

    #[tokio::test]
    async fn test_event_hub_fan_out() {
        let hub = EventHub::default();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_ne!(first.id, second.id);
        assert_eq!(hub.listener_count(), 2);

        hub.emit(WalletEvent::ChainChanged(1));
        assert_eq!(first.events.recv().await, Some(WalletEvent::ChainChanged(1)));
        assert_eq!(second.events.recv().await, Some(WalletEvent::ChainChanged(1)));

        assert!(hub.unsubscribe(first.id));
        assert!(!hub.unsubscribe(first.id));
        hub.emit(WalletEvent::AccountsChanged(Vec::new()));
        assert_eq!(second.events.recv().await, Some(WalletEvent::AccountsChanged(Vec::new())));
        assert_eq!(hub.listener_count(), 1);
    }

    #[test]
    fn test_event_hub_prunes_dropped_receivers() {
        let hub = EventHub::default();
        let subscription = hub.subscribe();
        drop(subscription);

        hub.emit(WalletEvent::ChainChanged(18504));
        assert_eq!(hub.listener_count(), 0);
    }
}
