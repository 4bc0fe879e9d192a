/// Direct Wallet Module
///
/// Talks EIP-1193 JSON-RPC to a wallet endpoint over HTTP. HTTP has no push
/// channel, so while anyone is subscribed a background task polls
/// `eth_accounts` and `eth_chainId` and turns differences into events.
use std::{sync::Arc, time::Duration};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::task::JoinHandle;

use super::{parse_accounts, EventHub, Subscription, SubscriptionId, WalletEvent, WalletProvider};
use crate::{
    chain::ChainSpec,
    error::{RpcError, WalletError},
    models::WalletAddress,
    rpc::JsonRpcClient,
};

pub struct DirectWallet {
    rpc: Option<Arc<JsonRpcClient>>,
    hub: Arc<EventHub>,
    poll_interval: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl DirectWallet {
    /// `endpoint` of `None` models a host without any wallet installed
    pub fn new(endpoint: Option<String>, timeout: Duration, poll_interval: Duration) -> Result<Self, RpcError> {
        let rpc = match endpoint {
            Some(url) => Some(Arc::new(JsonRpcClient::new(url, timeout)?)),
            None => None,
        };
        Ok(Self { rpc, hub: Arc::new(EventHub::default()), poll_interval, poller: Mutex::new(None) })
    }

    fn rpc(&self) -> Result<&JsonRpcClient, WalletError> {
        self.rpc.as_deref().ok_or(WalletError::ProviderMissing)
    }

    fn start_polling(&self, rpc: Arc<JsonRpcClient>) {
        let mut poller = self.poller.lock();
        if poller.is_some() {
            return;
        }
        tracing::debug!("Polling wallet at {} every {:?}", rpc.endpoint(), self.poll_interval);
        *poller = Some(tokio::spawn(poll_wallet(rpc, Arc::clone(&self.hub), self.poll_interval)));
    }
}

impl Drop for DirectWallet {
    fn drop(&mut self) {
        if let Some(task) = self.poller.lock().take() {
            task.abort();
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Observed {
    accounts: Option<Vec<WalletAddress>>,
    chain_id: Option<u64>,
}

impl Observed {
    /// Record a fresh observation and return the events it implies. The first
    /// observation of each value only sets the baseline.
    fn update(&mut self, accounts: Vec<WalletAddress>, chain_id: u64) -> Vec<WalletEvent> {
        let mut events = Vec::new();
        match &self.accounts {
            Some(previous) if *previous != accounts => events.push(WalletEvent::AccountsChanged(accounts.clone())),
            _ => {}
        }
        match self.chain_id {
            Some(previous) if previous != chain_id => events.push(WalletEvent::ChainChanged(chain_id)),
            _ => {}
        }
        self.accounts = Some(accounts);
        self.chain_id = Some(chain_id);
        events
    }
}

async fn poll_wallet(rpc: Arc<JsonRpcClient>, hub: Arc<EventHub>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    let mut observed = Observed::default();

    loop {
        ticker.tick().await;

        let accounts = match rpc.request::<_, Vec<String>>("eth_accounts", json!([])).await {
            Ok(raw) => match parse_accounts(&raw) {
                Ok(accounts) => accounts,
                Err(e) => {
                    tracing::warn!("Ignoring wallet poll result: {}", e);
                    continue;
                }
            },
            Err(e) => {
                tracing::debug!("Wallet poll failed: {}", e);
                continue;
            }
        };
        let chain_id = match rpc.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                tracing::debug!("Wallet poll failed: {}", e);
                continue;
            }
        };

        for event in observed.update(accounts, chain_id) {
            tracing::info!("Wallet reported {:?}", event);
            hub.emit(event);
        }
    }
}

impl WalletProvider for DirectWallet {
    fn kind(&self) -> &'static str {
        "direct"
    }

    fn is_available(&self) -> bool {
        self.rpc.is_some()
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<WalletAddress>, WalletError>> {
        async move {
            let raw: Vec<String> = self
                .rpc()?
                .request("eth_requestAccounts", json!([]))
                .await
                .map_err(|e| WalletError::from_rpc(e, None))?;
            parse_accounts(&raw)
        }
        .boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move { self.rpc()?.chain_id().await.map_err(|e| WalletError::from_rpc(e, None)) }.boxed()
    }

    fn request_chain_switch(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            let params = json!([{ "chainId": format!("{:#x}", chain_id) }]);
            self.rpc()?
                .request_unit("wallet_switchEthereumChain", params)
                .await
                .map_err(|e| WalletError::from_rpc(e, Some(chain_id)))
        }
        .boxed()
    }

    fn request_add_chain<'a>(&'a self, chain: &'a ChainSpec) -> BoxFuture<'a, Result<(), WalletError>> {
        async move {
            self.rpc()?
                .request_unit("wallet_addEthereumChain", [chain.add_chain_params()])
                .await
                .map_err(|e| WalletError::from_rpc(e, None))
        }
        .boxed()
    }

    fn subscribe(&self) -> Subscription {
        let subscription = self.hub.subscribe();
        if let Some(rpc) = &self.rpc {
            self.start_polling(Arc::clone(rpc));
        }
        subscription
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.unsubscribe(id);
        if self.hub.listener_count() == 0 {
            if let Some(task) = self.poller.lock().take() {
                tracing::debug!("Stopping wallet poller");
                task.abort();
            }
        }
    }
}
