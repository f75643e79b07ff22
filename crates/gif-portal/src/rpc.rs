//! [`LedgerClient`] over Solana's JSON-RPC HTTP API.

use std::cell::Cell;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{Commitment, PortConfig};
use crate::error::PortError;
use crate::ledger::{AccountInfo, LedgerClient};

pub struct RpcLedgerClient {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
    next_id: Cell<u64>,
}

impl RpcLedgerClient {
    pub fn new(url: impl Into<String>, commitment: Commitment) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            commitment,
            next_id: Cell::new(1),
        }
    }

    /// Client for the configured cluster and preflight commitment.
    pub fn from_config(config: &PortConfig) -> Self {
        Self::new(
            config.network.rpc_url(),
            config.options.preflight_commitment,
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, PortError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        log::debug!("rpc {method} #{id} -> {}", self.url);

        let body = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_response(method, &body)
    }
}

#[async_trait(?Send)]
impl LedgerClient for RpcLedgerClient {
    async fn get_account(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, PortError> {
        let params = json!([
            chain_sol::bytes_to_address(address),
            { "encoding": "base64", "commitment": self.commitment.as_str() }
        ]);
        let response: WithContext<Option<RpcAccount>> =
            self.call("getAccountInfo", params).await?;
        response.value.map(RpcAccount::into_account_info).transpose()
    }

    async fn get_latest_blockhash(&self) -> Result<[u8; 32], PortError> {
        let params = json!([{ "commitment": self.commitment.as_str() }]);
        let response: WithContext<RpcBlockhash> = self.call("getLatestBlockhash", params).await?;
        chain_sol::address_to_bytes(&response.value.blockhash)
            .map_err(|e| PortError::Rpc(format!("bad blockhash: {e}")))
    }

    async fn send_transaction(&self, wire_tx: &[u8]) -> Result<String, PortError> {
        let params = json!([
            STANDARD.encode(wire_tx),
            { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
        ]);
        self.call("sendTransaction", params).await
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct RpcAccount {
    /// `[payload, encoding]`
    data: (String, String),
    owner: String,
    lamports: u64,
}

impl RpcAccount {
    fn into_account_info(self) -> Result<AccountInfo, PortError> {
        let (payload, encoding) = self.data;
        if encoding != "base64" {
            return Err(PortError::Rpc(format!("unexpected account encoding {encoding:?}")));
        }
        let data = STANDARD
            .decode(payload)
            .map_err(|e| PortError::Rpc(format!("bad account data: {e}")))?;
        let owner = chain_sol::address_to_bytes(&self.owner)
            .map_err(|e| PortError::Rpc(format!("bad account owner: {e}")))?;

        Ok(AccountInfo {
            owner,
            lamports: self.lamports,
            data,
        })
    }
}

#[derive(Deserialize)]
struct RpcBlockhash {
    blockhash: String,
}

fn parse_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, PortError> {
    let response: RpcResponse<T> = serde_json::from_str(body)
        .map_err(|e| PortError::Rpc(format!("{method}: malformed response: {e}")))?;

    if let Some(err) = response.error {
        return Err(PortError::Rpc(format!(
            "{method}: {} (code {})",
            err.message, err.code
        )));
    }

    response
        .result
        .ok_or_else(|| PortError::Rpc(format!("{method}: response has no result")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_info_is_decoded() {
        let body = r#"{
            "jsonrpc": "2.0", "id": 1,
            "result": {
                "context": {"slot": 1},
                "value": {
                    "data": ["AQID", "base64"],
                    "executable": false,
                    "lamports": 1000,
                    "owner": "11111111111111111111111111111111",
                    "rentEpoch": 0
                }
            }
        }"#;
        let parsed: WithContext<Option<RpcAccount>> = parse_response("getAccountInfo", body).unwrap();
        let info = parsed.value.unwrap().into_account_info().unwrap();
        assert_eq!(info.data, vec![1, 2, 3]);
        assert_eq!(info.owner, [0u8; 32]);
        assert_eq!(info.lamports, 1000);
    }

    #[test]
    fn missing_account_is_none() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":1},"value":null}}"#;
        let parsed: WithContext<Option<RpcAccount>> = parse_response("getAccountInfo", body).unwrap();
        assert!(parsed.value.is_none());
    }

    #[test]
    fn blockhash_is_read() {
        let body = r#"{"jsonrpc":"2.0","id":2,"result":{"context":{"slot":1},
            "value":{"blockhash":"11111111111111111111111111111111","lastValidBlockHeight":9}}}"#;
        let parsed: WithContext<RpcBlockhash> = parse_response("getLatestBlockhash", body).unwrap();
        assert_eq!(parsed.value.blockhash, "11111111111111111111111111111111");
    }

    #[test]
    fn rpc_error_object_becomes_port_error() {
        let body = r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32002,"message":"Transaction simulation failed"}}"#;
        let err = parse_response::<String>("sendTransaction", body).unwrap_err();
        assert!(matches!(err, PortError::Rpc(_)));
        assert!(err.to_string().contains("simulation failed"));
        assert!(err.to_string().contains("-32002"));
    }

    #[test]
    fn non_json_body_is_rejected() {
        let err = parse_response::<String>("sendTransaction", "<html>").unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn unexpected_encoding_is_rejected() {
        let account = RpcAccount {
            data: ("AQID".into(), "base58".into()),
            owner: "11111111111111111111111111111111".into(),
            lamports: 0,
        };
        assert!(account.into_account_info().is_err());
    }

    #[test]
    fn client_uses_configured_cluster() {
        let client = RpcLedgerClient::from_config(&PortConfig::default());
        assert_eq!(client.url(), "https://api.devnet.solana.com");
    }

    #[test]
    fn request_is_json_rpc_2() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "getLatestBlockhash",
            params: json!([{"commitment": "processed"}]),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["params"][0]["commitment"], "processed");
    }
}
