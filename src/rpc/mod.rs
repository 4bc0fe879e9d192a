/// RPC Client Module
///
/// This module handles all JSON-RPC traffic: read-only `eth_call`s against the
/// chain endpoint and EIP-1193 style wallet requests against a wallet endpoint.
/// Both speak the same envelope, so one client serves both.
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alloy_primitives::{hex, Bytes};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::{chain::parse_chain_id, error::RpcError, models::WalletAddress};

pub struct JsonRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcClient {
    /// Create a new client for the given endpoint. `timeout` bounds every request.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, endpoint: endpoint.into(), next_id: AtomicU64::new(1) })
    }

    /// Get the endpoint URL this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issue one JSON-RPC request and decode its `result`
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let envelope = self.send(method, params).await?;
        decode_envelope(method, envelope)
    }

    /// Issue a request whose successful result is `null` (wallet_switchEthereumChain and friends)
    pub async fn request_unit<P: Serialize>(&self, method: &str, params: P) -> Result<(), RpcError> {
        let envelope: RpcResponse<serde_json::Value> = self.send(method, params).await?;
        match envelope.error {
            Some(err) => Err(RpcError::Rpc { code: err.code, message: err.message }),
            None => Ok(()),
        }
    }

    async fn send<P, R>(&self, method: &str, params: P) -> Result<RpcResponse<R>, RpcError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("rpc {} -> {} (id {})", method, self.endpoint, id);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&RpcRequest { jsonrpc: "2.0", id, method, params })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Get the chain id the endpoint is serving
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_chain_id(&raw).ok_or_else(|| RpcError::Malformed(format!("invalid chain id '{}'", raw)))
    }

    /// Execute a read-only contract call at the latest block
    pub async fn eth_call(&self, to: &WalletAddress, data: &[u8]) -> Result<Bytes, RpcError> {
        let params = json!([{ "to": to.to_string(), "data": format!("0x{}", hex::encode(data)) }, "latest"]);
        let raw: String = self.request("eth_call", params).await?;

        hex::decode(raw.trim_start_matches("0x"))
            .map(Bytes::from)
            .map_err(|e| RpcError::Malformed(format!("eth_call returned non-hex data: {}", e)))
    }
}

fn decode_envelope<R>(method: &str, envelope: RpcResponse<R>) -> Result<R, RpcError> {
    if let Some(err) = envelope.error {
        return Err(RpcError::Rpc { code: err.code, message: err.message });
    }
    envelope.result.ok_or_else(|| RpcError::Malformed(format!("{} response has neither result nor error", method)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<R: DeserializeOwned>(value: serde_json::Value) -> Result<R, RpcError> {
        let envelope: RpcResponse<R> = serde_json::from_value(value).unwrap();
        decode_envelope("test_method", envelope)
    }

    #[test]
    fn test_decode_result() {
        let chain: String = parse(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x4848" })).unwrap();
        assert_eq!(chain, "0x4848");

        let accounts: Vec<String> =
            parse(json!({ "jsonrpc": "2.0", "id": 2, "result": ["0x71c7656ec7ab88b098defb751b7401b5f6d8976f"] }))
                .unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_decode_error_object() {
        let result: Result<String, _> = parse(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": { "code": 4902, "message": "Unrecognized chain ID \"0x4848\"." }
        }));

        match result {
            Err(RpcError::Rpc { code, message }) => {
                assert_eq!(code, 4902);
                assert!(message.contains("0x4848"));
            }
            other => panic!("expected rpc error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_decode_missing_result() {
        let result: Result<String, _> = parse(json!({ "jsonrpc": "2.0", "id": 4 }));
        assert!(matches!(result, Err(RpcError::Malformed(_))));
    }

    #[test]
    fn test_request_serialization() {
        let request = RpcRequest { jsonrpc: "2.0", id: 7, method: "eth_chainId", params: json!([]) };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["method"], "eth_chainId");
        assert_eq!(value["id"], 7);
        assert_eq!(value["params"], json!([]));
    }
}
