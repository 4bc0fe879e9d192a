//! ABI bindings for the read-only surface of the TicketorNFT contract.

use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};

use crate::{
    error::GatewayError,
    models::{RawTicket, TicketId, WalletAddress},
};

sol! {
    struct TicketView {
        uint256 eventId;
        string eventName;
        string seatInfo;
        uint256 eventDate;
        bytes32 qrHash;
        bool redeemed;
        uint256 redeemedAt;
        address redeemedBy;
        address currentOwner;
    }

    function getTicketsByOwner(address owner) external view returns (uint256[] memory);
    function getTicket(uint256 tokenId) external view returns (TicketView memory);
    function getQRData(uint256 tokenId) external view returns (string memory);
}

pub fn encode_tickets_by_owner(owner: &WalletAddress) -> Vec<u8> {
    getTicketsByOwnerCall { owner: owner.address() }.abi_encode()
}

pub fn decode_tickets_by_owner(data: &[u8]) -> Result<Vec<TicketId>, GatewayError> {
    let ids: Vec<U256> = getTicketsByOwnerCall::abi_decode_returns(data, true)?._0;
    Ok(ids.into_iter().map(TicketId).collect())
}

pub fn encode_ticket(token_id: TicketId) -> Vec<u8> {
    getTicketCall { tokenId: token_id.0 }.abi_encode()
}

pub fn decode_ticket(data: &[u8]) -> Result<RawTicket, GatewayError> {
    let view = getTicketCall::abi_decode_returns(data, true)?._0;
    Ok(view.into())
}

pub fn encode_qr_data(token_id: TicketId) -> Vec<u8> {
    getQRDataCall { tokenId: token_id.0 }.abi_encode()
}

pub fn decode_qr_data(data: &[u8]) -> Result<String, GatewayError> {
    Ok(getQRDataCall::abi_decode_returns(data, true)?._0)
}

impl From<TicketView> for RawTicket {
    fn from(view: TicketView) -> Self {
        RawTicket {
            event_id: view.eventId,
            event_name: view.eventName,
            seat_info: view.seatInfo,
            event_date_unix: view.eventDate,
            qr_hash: view.qrHash,
            redeemed: view.redeemed,
            redeemed_at_unix: view.redeemedAt,
            redeemed_by: view.redeemedBy.into(),
            current_owner: view.currentOwner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use alloy_sol_types::{SolType, SolValue};

    const OWNER: &str = "0x71c7656ec7ab88b098defb751b7401b5f6d8976f";

    #[test]
    fn test_selectors() {
        assert_eq!(getTicketsByOwnerCall::SIGNATURE, "getTicketsByOwner(address)");
        assert_eq!(getTicketCall::SIGNATURE, "getTicket(uint256)");
        assert_eq!(getQRDataCall::SIGNATURE, "getQRData(uint256)");

        let owner = WalletAddress::parse(OWNER).unwrap();
        let calldata = encode_tickets_by_owner(&owner);
        assert_eq!(&calldata[..4], &getTicketsByOwnerCall::SELECTOR);
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[16..36], owner.address().as_slice());
    }

    #[test]
    fn test_decode_owned_ids() {
        let big = U256::from(u128::MAX) * U256::from(3u64);
        let data = vec![U256::from(12345u64), U256::from(67890u64), big].abi_encode();

        let ids = decode_tickets_by_owner(&data).unwrap();
        assert_eq!(ids, vec![TicketId::from_u64(12345), TicketId::from_u64(67890), TicketId(big)]);
    }

    #[test]
    fn test_decode_ticket_view() {
        let owner: Address = WalletAddress::parse(OWNER).unwrap().address();
        let view = TicketView {
            eventId: U256::from(3u64),
            eventName: "Classical Concert Gala".to_string(),
            seatInfo: "Elbphilharmonie Hamburg".to_string(),
            eventDate: U256::from(1751745600u64),
            qrHash: B256::repeat_byte(0xab),
            redeemed: true,
            redeemedAt: U256::from(1751749200u64),
            redeemedBy: owner,
            currentOwner: owner,
        };
        let data = <TicketView as SolType>::abi_encode(&view);

        let raw = decode_ticket(&data).unwrap();
        assert_eq!(raw.event_name, "Classical Concert Gala");
        assert_eq!(raw.seat_info, "Elbphilharmonie Hamburg");
        assert!(raw.redeemed);
        assert_eq!(raw.redeemed_at_unix, U256::from(1751749200u64));
        assert_eq!(raw.current_owner.to_string(), OWNER);
    }

    #[test]
    fn test_decode_qr_data() {
        let data = "TICKET:11223".to_string().abi_encode();
        assert_eq!(decode_qr_data(&data).unwrap(), "TICKET:11223");
    }

    #[test]
    fn test_malformed_return_is_contract_error() {
        let result = decode_ticket(&[0u8; 7]);
        assert!(matches!(result, Err(GatewayError::Contract(_))));
    }
}
