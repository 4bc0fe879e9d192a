/// Mock Wallet Module
///
/// Scriptable in-memory wallet used by demo mode and the controller tests.
/// Like a browser wallet it emits `ChainChanged` after a successful switch.
use std::{collections::HashSet, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use super::{EventHub, Subscription, SubscriptionId, WalletEvent, WalletProvider};
use crate::{chain::ChainSpec, error::WalletError, models::WalletAddress};

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    RequestAccounts,
    ChainId,
    SwitchChain(u64),
    AddChain(u64),
}

#[derive(Debug)]
struct MockState {
    accounts: Vec<WalletAddress>,
    chain_id: u64,
    known_chains: HashSet<u64>,
    reject_accounts: bool,
    reject_switch: bool,
    fail_add: bool,
    calls: Vec<WalletCall>,
}

struct MockInner {
    installed: bool,
    state: Mutex<MockState>,
    hub: EventHub,
}

#[derive(Clone)]
pub struct MockWallet {
    inner: Arc<MockInner>,
}

impl MockWallet {
    /// An installed wallet exposing `accounts` on `chain_id`
    pub fn new(accounts: Vec<WalletAddress>, chain_id: u64) -> Self {
        Self::build(true, accounts, chain_id)
    }

    fn build(installed: bool, accounts: Vec<WalletAddress>, chain_id: u64) -> Self {
        let state = MockState {
            accounts,
            chain_id,
            known_chains: HashSet::from([chain_id]),
            reject_accounts: false,
            reject_switch: false,
            fail_add: false,
            calls: Vec::new(),
        };
        Self { inner: Arc::new(MockInner { installed, state: Mutex::new(state), hub: EventHub::default() }) }
    }

    fn record(&self, call: WalletCall) -> Result<(), WalletError> {
        if !self.inner.installed {
            return Err(WalletError::ProviderMissing);
        }
        self.inner.state.lock().calls.push(call);
        Ok(())
    }
}

/// Scripting knobs and inspection used by tests
#[cfg(test)]
impl MockWallet {
    /// No wallet installed: every request fails with `ProviderMissing`
    pub fn missing() -> Self {
        Self::build(false, Vec::new(), 0)
    }

    /// Make the wallet already know `chain_id`, so switching needs no add-chain step
    pub fn with_known_chain(self, chain_id: u64) -> Self {
        self.inner.state.lock().known_chains.insert(chain_id);
        self
    }

    /// The user declines the account prompt
    pub fn rejecting_accounts(self) -> Self {
        self.inner.state.lock().reject_accounts = true;
        self
    }

    /// The user declines every chain switch prompt
    pub fn rejecting_switch(self) -> Self {
        self.inner.state.lock().reject_switch = true;
        self
    }

    /// Adding a chain fails
    pub fn failing_add_chain(self) -> Self {
        self.inner.state.lock().fail_add = true;
        self
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.inner.state.lock().calls.clone()
    }

    pub fn current_chain(&self) -> u64 {
        self.inner.state.lock().chain_id
    }

    pub fn listener_count(&self) -> usize {
        self.inner.hub.listener_count()
    }

    /// Simulate the user switching or disconnecting accounts in the wallet
    pub fn emit_accounts_changed(&self, accounts: Vec<WalletAddress>) {
        self.inner.state.lock().accounts = accounts.clone();
        self.inner.hub.emit(WalletEvent::AccountsChanged(accounts));
    }

    /// Simulate the user picking another network in the wallet
    pub fn emit_chain_changed(&self, chain_id: u64) {
        {
            let mut state = self.inner.state.lock();
            state.chain_id = chain_id;
            state.known_chains.insert(chain_id);
        }
        self.inner.hub.emit(WalletEvent::ChainChanged(chain_id));
    }
}

impl WalletProvider for MockWallet {
    fn kind(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.inner.installed
    }

    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<WalletAddress>, WalletError>> {
        async move {
            self.record(WalletCall::RequestAccounts)?;
            let state = self.inner.state.lock();
            if state.reject_accounts {
                return Err(WalletError::UserRejected);
            }
            Ok(state.accounts.clone())
        }
        .boxed()
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, WalletError>> {
        async move {
            self.record(WalletCall::ChainId)?;
            Ok(self.inner.state.lock().chain_id)
        }
        .boxed()
    }

    fn request_chain_switch(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        async move {
            self.record(WalletCall::SwitchChain(chain_id))?;
            {
                let mut state = self.inner.state.lock();
                if state.reject_switch {
                    return Err(WalletError::UserRejected);
                }
                if !state.known_chains.contains(&chain_id) {
                    return Err(WalletError::UnrecognizedChain(chain_id));
                }
                if state.chain_id == chain_id {
                    return Ok(());
                }
                state.chain_id = chain_id;
            }
            self.inner.hub.emit(WalletEvent::ChainChanged(chain_id));
            Ok(())
        }
        .boxed()
    }

    fn request_add_chain<'a>(&'a self, chain: &'a ChainSpec) -> BoxFuture<'a, Result<(), WalletError>> {
        async move {
            self.record(WalletCall::AddChain(chain.chain_id))?;
            let mut state = self.inner.state.lock();
            if state.fail_add {
                return Err(WalletError::Rpc { code: -32603, message: "add chain failed".to_string() });
            }
            state.known_chains.insert(chain.chain_id);
            Ok(())
        }
        .boxed()
    }

    fn subscribe(&self) -> Subscription {
        self.inner.hub.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.hub.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> WalletAddress {
        WalletAddress::parse("0x71c7656ec7ab88b098defb751b7401b5f6d8976f").unwrap()
    }

    #[tokio::test]
    async fn test_missing_wallet() {
        let wallet = MockWallet::missing();
        assert!(!wallet.is_available());
        assert!(matches!(wallet.request_accounts().await, Err(WalletError::ProviderMissing)));
        assert!(wallet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_switch_requires_known_chain() {
        let wallet = MockWallet::new(vec![account()], 1);
        let mut subscription = wallet.subscribe();

        assert!(matches!(wallet.request_chain_switch(18504).await, Err(WalletError::UnrecognizedChain(18504))));
        wallet.request_add_chain(&ChainSpec::hilbert_hotel()).await.unwrap();
        wallet.request_chain_switch(18504).await.unwrap();

        assert_eq!(wallet.current_chain(), 18504);
        assert_eq!(subscription.events.recv().await, Some(WalletEvent::ChainChanged(18504)));
        assert_eq!(
            wallet.calls(),
            vec![WalletCall::SwitchChain(18504), WalletCall::AddChain(18504), WalletCall::SwitchChain(18504)]
        );
    }

    #[tokio::test]
    async fn test_rejections() {
        let wallet = MockWallet::new(vec![account()], 1).with_known_chain(18504).rejecting_switch();
        assert!(matches!(wallet.request_chain_switch(18504).await, Err(WalletError::UserRejected)));
        assert_eq!(wallet.current_chain(), 1);

        let wallet = MockWallet::new(vec![account()], 18504).rejecting_accounts();
        assert!(matches!(wallet.request_accounts().await, Err(WalletError::UserRejected)));
    }
}
