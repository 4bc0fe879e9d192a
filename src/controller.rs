/// Connection Controller Module
///
/// Single actor that owns the wallet session. Every transition is serialized
/// through its `run` loop: user intents arrive on a command channel, wallet
/// events on the provider subscription, and finished ticket loads on an
/// internal channel. Observers read immutable `Snapshot`s from a watch
/// channel and status transitions from a broadcast channel.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch};

use crate::{
    chain::ChainSpec,
    error::{ControllerClosed, GatewayError, WalletError, PROVIDER_MISSING_MESSAGE},
    gateway::ContractGateway,
    models::{shorten, SessionStatus, Snapshot, TicketCollection, WalletAddress},
    pipeline::{self, LoadReport},
    transform::TicketClock,
    wallet::{Subscription, SubscriptionId, WalletEvent, WalletProvider},
};

const NOT_CONNECTED: &str = "Not Connected";
const CONNECT_FAILED_MESSAGE: &str = "Failed to connect wallet. Please try again.";
const TRANSITION_BUFFER: usize = 64;

/// Why `run` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Shutdown was requested or every handle was dropped
    Shutdown,
    /// The wallet moved to another chain; the host must rebuild the session from scratch
    ReloadRequested { chain_id: u64 },
}

#[derive(Debug)]
enum Command {
    Connect { seen_revision: u64 },
    Shutdown,
}

struct LoadFinished {
    cycle: u64,
    owner: WalletAddress,
    result: Result<LoadReport, GatewayError>,
}

#[derive(Debug, Clone)]
struct WalletSession {
    address: Option<WalletAddress>,
    chain_id: Option<u64>,
    status: SessionStatus,
    error_message: Option<String>,
}

impl WalletSession {
    fn disconnected() -> Self {
        Self { address: None, chain_id: None, status: SessionStatus::Disconnected, error_message: None }
    }
}

pub struct ConnectionController {
    chain: Arc<ChainSpec>,
    wallet: Arc<dyn WalletProvider>,
    gateway: Arc<dyn ContractGateway>,
    clock: TicketClock,
    session: WalletSession,
    tickets: TicketCollection,
    is_loading: bool,
    loaded_at: Option<DateTime<Utc>>,
    load_cycle: u64,
    revision: u64,
    last_attempt_revision: u64,
    snapshot_tx: watch::Sender<Snapshot>,
    transition_tx: broadcast::Sender<SessionStatus>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    load_tx: mpsc::UnboundedSender<LoadFinished>,
    load_rx: mpsc::UnboundedReceiver<LoadFinished>,
}

/// Cloneable front end of a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<Snapshot>,
    transition_tx: broadcast::Sender<SessionStatus>,
}

impl ControllerHandle {
    /// Ask for a wallet connection. Ignored unless the session is
    /// Disconnected or Error; repeated intents collapse into one attempt.
    pub fn connect(&self) -> Result<(), ControllerClosed> {
        if self.command_tx.is_closed() {
            return Err(ControllerClosed);
        }
        let (status, revision) = {
            let snapshot = self.snapshot_rx.borrow();
            (snapshot.status, snapshot.revision)
        };
        if !status.accepts_connect() {
            tracing::debug!("connect() ignored while {}", status);
            return Ok(());
        }
        self.command_tx.send(Command::Connect { seen_revision: revision }).map_err(|_| ControllerClosed)
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown);
    }

    /// The latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Every status change, in order
    pub fn transitions(&self) -> broadcast::Receiver<SessionStatus> {
        self.transition_tx.subscribe()
    }
}

impl ConnectionController {
    pub fn new(
        chain: Arc<ChainSpec>,
        wallet: Arc<dyn WalletProvider>,
        gateway: Arc<dyn ContractGateway>,
        clock: TicketClock,
    ) -> (Self, ControllerHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (load_tx, load_rx) = mpsc::unbounded_channel();
        let (transition_tx, _) = broadcast::channel(TRANSITION_BUFFER);

        let contract = gateway.contract_address().to_string();
        let initial = Snapshot {
            revision: 0,
            status: SessionStatus::Disconnected,
            address: None,
            shortened_address: None,
            network_name: NOT_CONNECTED.to_string(),
            is_loading: false,
            tickets: TicketCollection::empty(),
            redeemed_count: 0,
            active_count: 0,
            error_message: None,
            shortened_contract: shorten(&contract),
            contract_address: contract,
            loaded_at: None,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let controller = Self {
            chain,
            wallet,
            gateway,
            clock,
            session: WalletSession::disconnected(),
            tickets: TicketCollection::empty(),
            is_loading: false,
            loaded_at: None,
            load_cycle: 0,
            revision: 0,
            last_attempt_revision: 0,
            snapshot_tx,
            transition_tx: transition_tx.clone(),
            command_rx,
            load_tx,
            load_rx,
        };
        let handle = ControllerHandle { command_tx, snapshot_rx, transition_tx };
        (controller, handle)
    }

    /// Drive the session until shutdown or a chain change
    pub async fn run(mut self) -> SessionOutcome {
        let Subscription { id, mut events } = self.wallet.subscribe();
        let mut events_open = true;
        tracing::info!("Connection controller started ({} wallet, chain {})", self.wallet.kind(), self.chain.name);

        let outcome = loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Connect { seen_revision }) => self.handle_connect(seen_revision).await,
                    Some(Command::Shutdown) | None => break SessionOutcome::Shutdown,
                },
                event = events.recv(), if events_open => match event {
                    Some(WalletEvent::AccountsChanged(accounts)) => self.handle_accounts_changed(accounts),
                    Some(WalletEvent::ChainChanged(chain_id)) => {
                        if let Some(outcome) = self.handle_chain_changed(chain_id) {
                            break outcome;
                        }
                    }
                    None => {
                        tracing::warn!("Wallet event stream closed");
                        events_open = false;
                    }
                },
                Some(finished) = self.load_rx.recv() => self.handle_load_finished(finished),
            }
        };

        self.teardown(id);
        outcome
    }

    async fn handle_connect(&mut self, seen_revision: u64) {
        let status = self.session.status;
        if !status.accepts_connect() {
            tracing::debug!("Ignoring connect while {}", status);
            return;
        }
        if seen_revision < self.last_attempt_revision {
            tracing::debug!("Connect intent from revision {} already served", seen_revision);
            return;
        }

        if !self.wallet.is_available() {
            tracing::warn!("No wallet provider available");
            self.fail(PROVIDER_MISSING_MESSAGE.to_string());
            self.last_attempt_revision = self.revision;
            return;
        }

        self.session.status = SessionStatus::Connecting;
        self.session.error_message = None;
        self.publish();
        self.last_attempt_revision = self.revision;

        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(WalletError::UserRejected) => {
                tracing::info!("User declined the account request");
                self.disconnect();
                return;
            }
            Err(WalletError::ProviderMissing) => {
                self.fail(PROVIDER_MISSING_MESSAGE.to_string());
                return;
            }
            Err(e) => {
                tracing::warn!("Account request failed: {}", e);
                self.fail(CONNECT_FAILED_MESSAGE.to_string());
                return;
            }
        };

        let Some(address) = accounts.first().copied() else {
            tracing::info!("Wallet shared no accounts");
            self.disconnect();
            return;
        };
        tracing::info!("Connected {} via {} wallet", address, self.wallet.kind());
        self.session.address = Some(address);
        self.reconcile_chain().await;
    }

    async fn reconcile_chain(&mut self) {
        let chain_id = match self.wallet.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                tracing::warn!("Could not read the wallet chain: {}", e);
                self.fail(CONNECT_FAILED_MESSAGE.to_string());
                return;
            }
        };
        self.session.chain_id = Some(chain_id);

        if chain_id == self.chain.chain_id {
            self.enter_connected();
            return;
        }

        tracing::info!("Wallet is on chain {}, {} is chain {}", chain_id, self.chain.name, self.chain.chain_id);
        self.session.status = SessionStatus::WrongNetwork;
        self.publish();
        self.switch_network().await;
    }

    async fn switch_network(&mut self) {
        self.session.status = SessionStatus::SwitchingNetwork;
        self.publish();

        let required = self.chain.chain_id;
        let first_attempt = self.wallet.request_chain_switch(required).await;
        let switched = match first_attempt {
            Err(WalletError::UnrecognizedChain(_)) => {
                tracing::info!("Wallet does not know {}, requesting it be added", self.chain.name);
                let added = self.wallet.request_add_chain(&self.chain).await;
                if let Err(e) = added {
                    tracing::warn!("Adding {} failed: {}", self.chain.name, e);
                    self.fail(format!("Failed to add {} to the wallet.", self.chain.name));
                    return;
                }
                self.wallet.request_chain_switch(required).await
            }
            other => other,
        };
        if let Err(e) = switched {
            tracing::warn!("Switching to {} failed: {}", self.chain.name, e);
            self.fail(format!("Failed to switch to {}.", self.chain.name));
            return;
        }

        let verified = self.wallet.chain_id().await;
        match verified {
            Ok(chain_id) if chain_id == required => {
                self.session.chain_id = Some(chain_id);
                self.enter_connected();
            }
            Ok(chain_id) => {
                tracing::warn!("Wallet still reports chain {} after switching", chain_id);
                self.session.chain_id = Some(chain_id);
                self.fail(format!("Failed to switch to {}.", self.chain.name));
            }
            Err(e) => {
                tracing::warn!("Could not verify the wallet chain: {}", e);
                self.fail(format!("Failed to switch to {}.", self.chain.name));
            }
        }
    }

    fn enter_connected(&mut self) {
        self.session.status = SessionStatus::Connected;
        self.session.error_message = None;
        self.publish();
        self.start_load();
    }

    fn start_load(&mut self) {
        let Some(owner) = self.session.address else {
            return;
        };
        self.load_cycle += 1;
        self.is_loading = true;
        self.publish();

        let cycle = self.load_cycle;
        let gateway = Arc::clone(&self.gateway);
        let clock = self.clock;
        let load_tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = pipeline::load_tickets(gateway.as_ref(), owner, &clock).await;
            let _ = load_tx.send(LoadFinished { cycle, owner, result });
        });
    }

    fn handle_load_finished(&mut self, finished: LoadFinished) {
        if finished.cycle != self.load_cycle {
            tracing::debug!("Discarding stale load {} for {}", finished.cycle, finished.owner);
            return;
        }

        self.tickets = match finished.result {
            Ok(report) => {
                for failure in &report.failures {
                    tracing::warn!(
                        "Ticket {} omitted for {} at {} stage: {}{}",
                        failure.token_id,
                        report.owner,
                        failure.stage,
                        failure.message,
                        if failure.retryable { " (retryable)" } else { "" }
                    );
                }
                if !report.failures.is_empty() {
                    let omitted = report.failures.len();
                    tracing::warn!("{} of {} tickets omitted for {}", omitted, report.ids_listed, report.owner);
                }
                report.into_collection()
            }
            Err(e) => {
                tracing::error!("Could not list tickets for {}: {}", finished.owner, e);
                TicketCollection::empty()
            }
        };
        self.is_loading = false;
        self.loaded_at = Some(Utc::now());
        self.publish();
    }

    fn handle_accounts_changed(&mut self, accounts: Vec<WalletAddress>) {
        let status = self.session.status;
        match accounts.first().copied() {
            None if self.session.address.is_none() && status == SessionStatus::Disconnected => {
                tracing::debug!("No accounts and nothing connected");
            }
            None => {
                tracing::info!("Wallet disconnected all accounts");
                self.disconnect();
            }
            Some(_) if self.session.address.is_none() => {
                tracing::debug!("Ignoring account change while {} without an account", status);
            }
            Some(address) if self.session.address == Some(address) => {
                tracing::debug!("Primary account unchanged");
            }
            Some(address) => {
                tracing::info!("Primary account changed to {}", address);
                self.session.address = Some(address);
                self.tickets = TicketCollection::empty();
                self.loaded_at = None;
                if status == SessionStatus::Connected {
                    self.start_load();
                } else {
                    self.publish();
                }
            }
        }
    }

    fn handle_chain_changed(&mut self, chain_id: u64) -> Option<SessionOutcome> {
        if self.session.chain_id == Some(chain_id) {
            tracing::debug!("Chain {} is already the session chain", chain_id);
            return None;
        }
        tracing::info!("Wallet moved to chain {}, reloading", chain_id);
        Some(SessionOutcome::ReloadRequested { chain_id })
    }

    /// Enter Error. The address stays in the session but is no longer published.
    fn fail(&mut self, message: String) {
        tracing::error!("{}", message);
        self.session.status = SessionStatus::Error;
        self.session.error_message = Some(message);
        self.publish();
    }

    fn disconnect(&mut self) {
        self.session = WalletSession::disconnected();
        self.tickets = TicketCollection::empty();
        self.is_loading = false;
        self.loaded_at = None;
        self.load_cycle += 1;
        self.publish();
    }

    fn teardown(&mut self, subscription: SubscriptionId) {
        self.wallet.unsubscribe(subscription);
        self.load_cycle += 1;
        tracing::info!("Connection controller stopped");
    }

    fn publish(&mut self) {
        self.revision += 1;
        let status = self.session.status;
        let address = self.session.address.filter(|_| status.holds_address()).map(|a| a.to_string());
        let network_name = match status {
            SessionStatus::Connected => self.chain.name.clone(),
            _ => NOT_CONNECTED.to_string(),
        };

        let contract = self.gateway.contract_address().to_string();
        let snapshot = Snapshot {
            revision: self.revision,
            status,
            shortened_address: address.as_deref().map(shorten),
            address,
            network_name,
            is_loading: self.is_loading,
            tickets: self.tickets.clone(),
            redeemed_count: self.tickets.redeemed_count(),
            active_count: self.tickets.active_count(),
            error_message: self.session.error_message.clone(),
            shortened_contract: shorten(&contract),
            contract_address: contract,
            loaded_at: self.loaded_at,
        };

        let previous = self.snapshot_tx.send_replace(snapshot);
        if previous.status != status {
            tracing::info!("Session {} -> {}", previous.status, status);
            let _ = self.transition_tx.send(status);
        }
    }
}
