/// Connector Wallet Module
///
/// A wallet whose account is managed by an external connector (for example a
/// WalletConnect bridge) and handed to this client as configuration. The
/// connector always targets the required chain, so the chain id is read from
/// the chain RPC endpoint and only a switch to that chain can succeed.
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::{EventHub, Subscription, SubscriptionId, WalletProvider};
use crate::{chain::ChainSpec, error::WalletError, models::WalletAddress, rpc::JsonRpcClient};

pub struct ConnectorWallet {
    account: Option<WalletAddress>,
    required_chain: u64,
    rpc: Arc<JsonRpcClient>,
    hub: EventHub,
}

impl ConnectorWallet {
    pub fn new(account: Option<WalletAddress>, required_chain: u64, rpc: Arc<JsonRpcClient>) -> Self {
        Self { account, required_chain, rpc, hub: EventHub::default() }
    }
}

impl WalletProvider for ConnectorWallet {
    fn kind(&self) -> &'static str {
        "connector"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<WalletAddress>, WalletError>> {
        async move { Ok(self.account.into_iter().collect()) }.boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move { self.rpc.chain_id().await.map_err(|e| WalletError::from_rpc(e, None)) }.boxed()
    }

    fn request_chain_switch(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            if chain_id == self.required_chain {
                Ok(())
            } else {
                Err(WalletError::UnrecognizedChain(chain_id))
            }
        }
        .boxed()
    }

    fn request_add_chain<'a>(&'a self, chain: &'a ChainSpec) -> BoxFuture<'a, Result<(), WalletError>> {
        async move {
            tracing::debug!("Connector manages {} itself; nothing to add", chain.name);
            Ok(())
        }
        .boxed()
    }

    // The connector pushes no events; subscriptions stay silent until released.
    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn connector(account: Option<WalletAddress>) -> ConnectorWallet {
        let rpc = JsonRpcClient::new("http://127.0.0.1:8545", Duration::from_secs(1)).unwrap();
        ConnectorWallet::new(account, 18504, Arc::new(rpc))
    }

    #[tokio::test]
    async fn test_accounts_come_from_configuration() {
        let account = WalletAddress::parse("0x71c7656ec7ab88b098defb751b7401b5f6d8976f").unwrap();
        assert_eq!(connector(Some(account)).request_accounts().await.unwrap(), vec![account]);
        assert!(connector(None).request_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_required_chain_switches() {
        let wallet = connector(None);
        assert!(wallet.request_chain_switch(18504).await.is_ok());
        assert!(matches!(wallet.request_chain_switch(1).await, Err(WalletError::UnrecognizedChain(1))));
        assert!(wallet.request_add_chain(&ChainSpec::hilbert_hotel()).await.is_ok());
    }
}
