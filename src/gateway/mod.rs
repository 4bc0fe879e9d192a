/// Contract Gateway Module
///
/// Read-only access to the ticket contract. Every call is independent and
/// idempotent; failures are scoped to the call that produced them.
pub mod abi;
pub mod mock;

use futures::future::{BoxFuture, FutureExt};

use crate::{
    error::GatewayError,
    models::{RawTicket, TicketId, WalletAddress},
    rpc::JsonRpcClient,
};

pub use mock::MockTicketContract;

/// Default deployment of the TicketorNFT contract
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x9FfD22337ea57daC396891526Cac42A03C76abfC";

pub trait ContractGateway: Send + Sync {
    /// Address of the ticket contract this gateway reads from
    fn contract_address(&self) -> WalletAddress;

    /// Every ticket id owned by `owner`, in contract order
    fn list_owned_ticket_ids(&self, owner: WalletAddress) -> BoxFuture<'_, Result<Vec<TicketId>, GatewayError>>;

    /// The on-chain record of one ticket
    fn ticket_detail(&self, token_id: TicketId) -> BoxFuture<'_, Result<RawTicket, GatewayError>>;

    /// The opaque redemption payload of one ticket. Not requested for redeemed tickets.
    fn qr_payload(&self, token_id: TicketId) -> BoxFuture<'_, Result<String, GatewayError>>;
}

/// Gateway backed by `eth_call` against the chain RPC endpoint
pub struct TicketContract {
    rpc: JsonRpcClient,
    address: WalletAddress,
}

impl TicketContract {
    pub fn new(rpc: JsonRpcClient, address: WalletAddress) -> Self {
        Self { rpc, address }
    }

    async fn call(&self, calldata: Vec<u8>) -> Result<Vec<u8>, GatewayError> {
        let data = self.rpc.eth_call(&self.address, &calldata).await?;
        if data.is_empty() {
            // Calls to an address without code succeed with empty data.
            return Err(GatewayError::Contract(format!("no contract code at {}", self.address)));
        }
        Ok(data.to_vec())
    }
}

impl ContractGateway for TicketContract {
    fn contract_address(&self) -> WalletAddress {
        self.address
    }

    fn list_owned_ticket_ids(&self, owner: WalletAddress) -> BoxFuture<'_, Result<Vec<TicketId>, GatewayError>> {
        async move {
            tracing::debug!("Fetching ticket ids owned by {}", owner);
            let data = self.call(abi::encode_tickets_by_owner(&owner)).await?;
            let ids = abi::decode_tickets_by_owner(&data)?;
            tracing::info!("Found {} tickets for {}", ids.len(), owner);
            Ok(ids)
        }
        .boxed()
    }

    fn ticket_detail(&self, token_id: TicketId) -> BoxFuture<'_, Result<RawTicket, GatewayError>> {
        async move {
            let data = self.call(abi::encode_ticket(token_id)).await?;
            abi::decode_ticket(&data)
        }
        .boxed()
    }

    fn qr_payload(&self, token_id: TicketId) -> BoxFuture<'_, Result<String, GatewayError>> {
        async move {
            let data = self.call(abi::encode_qr_data(token_id)).await?;
            abi::decode_qr_data(&data)
        }
        .boxed()
    }
}
