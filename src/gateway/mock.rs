/// Mock Contract Module
///
/// In-memory ticket contract for demo mode and tests. Serves a fixed
/// inventory, can simulate broken records and slow owners, and records every
/// call it receives.
use std::{collections::HashMap, time::Duration};

use alloy_primitives::{Address, B256, U256};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use super::ContractGateway;
use crate::{
    error::GatewayError,
    models::{RawTicket, TicketId, WalletAddress},
};

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    ListOwned(WalletAddress),
    Detail(TicketId),
    QrPayload(TicketId),
}

#[derive(Debug, Clone)]
enum MockRecord {
    Ticket { raw: RawTicket, qr_payload: String },
    #[cfg(test)]
    Broken(String),
}

pub struct MockTicketContract {
    address: WalletAddress,
    inventory: Vec<TicketId>,
    by_owner: HashMap<WalletAddress, Vec<TicketId>>,
    latency: HashMap<WalletAddress, Duration>,
    records: HashMap<TicketId, MockRecord>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl MockTicketContract {
    /// An empty contract: every owner holds no tickets
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            inventory: Vec::new(),
            by_owner: HashMap::new(),
            latency: HashMap::new(),
            records: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a ticket to the inventory every owner sees
    pub fn with_ticket(mut self, token_id: TicketId, raw: RawTicket, qr_payload: impl Into<String>) -> Self {
        self.inventory.push(token_id);
        self.records.insert(token_id, MockRecord::Ticket { raw, qr_payload: qr_payload.into() });
        self
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().push(call);
    }

    /// The Ticketor demo inventory: four tickets, one of them already redeemed
    pub fn demo(address: WalletAddress, holder: WalletAddress) -> Self {
        let ticket = |event_id: u64, name: &str, seat: &str, date: u64, redeemed_at: Option<u64>| RawTicket {
            event_id: U256::from(event_id),
            event_name: name.to_string(),
            seat_info: seat.to_string(),
            event_date_unix: U256::from(date),
            qr_hash: B256::repeat_byte(event_id as u8),
            redeemed: redeemed_at.is_some(),
            redeemed_at_unix: U256::from(redeemed_at.unwrap_or_default()),
            redeemed_by: redeemed_at.map(|_| holder).unwrap_or_else(|| Address::ZERO.into()),
            current_owner: holder,
        };

        Self::new(address)
            .with_ticket(
                TicketId::from_u64(12345),
                ticket(1, "Rock am Ring 2025", "Nürburgring - VIP", 1750010400, None),
                "TICKET:12345",
            )
            .with_ticket(
                TicketId::from_u64(67890),
                ticket(2, "FC Bayern vs. Dortmund", "Allianz Arena - Standard", 1747755000, Some(1747641600)),
                "TICKET:67890",
            )
            .with_ticket(
                TicketId::from_u64(11223),
                ticket(3, "Classical Concert Gala", "Elbphilharmonie Hamburg - Premium", 1751745600, None),
                "TICKET:11223",
            )
            .with_ticket(
                TicketId::from_u64(44556),
                ticket(4, "Tech Conference 2025", "Messe Berlin - All-Access", 1754816400, None),
                "TICKET:44556",
            )
    }
}

/// Scenario builders and call inspection used by tests
#[cfg(test)]
impl MockTicketContract {
    /// Add an id to the inventory whose detail call reverts
    pub fn with_broken_ticket(mut self, token_id: TicketId, reason: impl Into<String>) -> Self {
        self.inventory.push(token_id);
        self.records.insert(token_id, MockRecord::Broken(reason.into()));
        self
    }

    /// Give `owner` its own id list instead of the shared inventory
    pub fn with_owner(mut self, owner: WalletAddress, token_ids: Vec<TicketId>) -> Self {
        self.by_owner.insert(owner, token_ids);
        self
    }

    /// Delay every ownership query for `owner`
    pub fn with_owner_latency(mut self, owner: WalletAddress, latency: Duration) -> Self {
        self.latency.insert(owner, latency);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }
}

impl ContractGateway for MockTicketContract {
    fn contract_address(&self) -> WalletAddress {
        self.address
    }

    fn list_owned_ticket_ids(&self, owner: WalletAddress) -> BoxFuture<'_, Result<Vec<TicketId>, GatewayError>> {
        async move {
            self.record(GatewayCall::ListOwned(owner));
            if let Some(latency) = self.latency.get(&owner) {
                tokio::time::sleep(*latency).await;
            }
            Ok(self.by_owner.get(&owner).cloned().unwrap_or_else(|| self.inventory.clone()))
        }
        .boxed()
    }

    fn ticket_detail(&self, token_id: TicketId) -> BoxFuture<'_, Result<RawTicket, GatewayError>> {
        async move {
            self.record(GatewayCall::Detail(token_id));
            match self.records.get(&token_id) {
                Some(MockRecord::Ticket { raw, .. }) => Ok(raw.clone()),
                #[cfg(test)]
                Some(MockRecord::Broken(reason)) => Err(GatewayError::Contract(reason.clone())),
                None => Err(GatewayError::Contract(format!("invalid token id {}", token_id))),
            }
        }
        .boxed()
    }

    fn qr_payload(&self, token_id: TicketId) -> BoxFuture<'_, Result<String, GatewayError>> {
        async move {
            self.record(GatewayCall::QrPayload(token_id));
            match self.records.get(&token_id) {
                Some(MockRecord::Ticket { qr_payload, .. }) => Ok(qr_payload.clone()),
                _ => Err(GatewayError::Contract(format!("no qr data for token id {}", token_id))),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(raw: &str) -> WalletAddress {
        WalletAddress::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_demo_inventory() {
        let holder = address("0x71c7656ec7ab88b098defb751b7401b5f6d8976f");
        let contract = MockTicketContract::demo(address("0x9ffd22337ea57dac396891526cac42a03c76abfc"), holder);

        let ids = contract.list_owned_ticket_ids(holder).await.unwrap();
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(rendered, vec!["12345", "67890", "11223", "44556"]);

        let redeemed = contract.ticket_detail(TicketId::from_u64(67890)).await.unwrap();
        assert!(redeemed.redeemed);
        assert_eq!(redeemed.redeemed_at_unix, U256::from(1747641600u64));
    }

    #[tokio::test]
    async fn test_unknown_and_broken_ids_revert() {
        let contract = MockTicketContract::new(address("0x9ffd22337ea57dac396891526cac42a03c76abfc"))
            .with_broken_ticket(TicketId::from_u64(2), "execution reverted");

        assert!(matches!(contract.ticket_detail(TicketId::from_u64(2)).await, Err(GatewayError::Contract(_))));
        assert!(matches!(contract.ticket_detail(TicketId::from_u64(9)).await, Err(GatewayError::Contract(_))));
        let expected = vec![GatewayCall::Detail(TicketId::from_u64(2)), GatewayCall::Detail(TicketId::from_u64(9))];
        assert_eq!(contract.calls(), expected);
    }
}
