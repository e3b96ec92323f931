//! # JSON-RPC Ledger Transport
//!
//! [`LedgerTransport`] over an Ethereum-style JSON-RPC endpoint. Each call
//! becomes one `eth_sendTransaction` request; signing is delegated to the
//! account manager behind the endpoint (node keystore or signer proxy).
//!
//! ## Request
//!
//! ```text
//! POST {rpc_url}
//! Authorization: Bearer {api_key}        (optional)
//! {"jsonrpc":"2.0","id":N,"method":"eth_sendTransaction",
//!  "params":[{"from":"0x..","to":"0x..","data":"0x..","chainId":"0x.."}]}
//! ```
//!
//! ## Error Mapping
//!
//! | Condition | GatewayError |
//! |-----------|--------------|
//! | client timeout | `Timeout` |
//! | connect failure, non-2xx status | `Network` |
//! | JSON-RPC `error` object | `Rejected { code, message }` |
//! | unparseable body, missing/invalid result | `InvalidResponse` |

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::gateway::{GatewayError, LedgerCall, LedgerTransport};
use crate::types::{Address, TxHash};
use crate::wallet::WalletIdentity;

const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

/// Transaction object for `eth_sendTransaction`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest {
    from: String,
    to: String,
    data: String,
    chain_id: String,
}

/// HTTP JSON-RPC transport.
pub struct JsonRpcTransport {
    rpc_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl fmt::Debug for JsonRpcTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRpcTransport")
            .field("rpc_url", &self.rpc_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("client", &"reqwest::Client")
            .finish()
    }
}

impl JsonRpcTransport {
    pub fn new(
        rpc_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            api_key,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sends one JSON-RPC request and returns its `result` value.
    async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let body = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let mut req_builder = self
            .client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json");
        if let Some(ref key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = req_builder.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Network(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network(format!("HTTP error: {}", status)));
        }

        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Network(format!("failed to read response: {}", e))
            }
        })?;

        let parsed: JsonRpcResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        if let Some(err) = parsed.error {
            debug!(method, code = err.code, message = %err.message, "rpc error");
            return Err(GatewayError::Rejected {
                code: err.code,
                message: err.message,
            });
        }

        parsed
            .result
            .ok_or_else(|| GatewayError::InvalidResponse("missing result in response".to_string()))
    }

    /// Reads `eth_chainId` and compares it with `expected`.
    ///
    /// Returns the chain id reported by the endpoint.
    pub async fn verify_chain_id(&self, expected: u64) -> Result<u64, GatewayError> {
        let result = self.request("eth_chainId", Value::Array(Vec::new())).await?;
        let actual = parse_quantity(&result)?;
        if actual != expected {
            warn!(expected, actual, "endpoint reports a different chain");
            return Err(GatewayError::Rejected {
                code: 0,
                message: format!("endpoint is on chain {}, expected {}", actual, expected),
            });
        }
        Ok(actual)
    }
}

fn parse_quantity(value: &Value) -> Result<u64, GatewayError> {
    let s = value
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse(format!("expected hex quantity, got {}", value)))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| GatewayError::InvalidResponse(format!("'{}' is not 0x-prefixed", s)))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| GatewayError::InvalidResponse(format!("invalid quantity '{}': {}", s, e)))
}

#[async_trait]
impl LedgerTransport for JsonRpcTransport {
    async fn send_call(
        &self,
        from: &WalletIdentity,
        contract: &Address,
        call: &LedgerCall,
    ) -> Result<TxHash, GatewayError> {
        let tx = TransactionRequest {
            from: from.address.to_hex(),
            to: contract.to_hex(),
            data: format!("0x{}", hex::encode(call.calldata())),
            chain_id: format!("0x{:x}", from.chain_id),
        };
        let params = serde_json::to_value([tx])
            .map_err(|e| GatewayError::InvalidResponse(format!("failed to encode request: {}", e)))?;

        let result = self.request("eth_sendTransaction", params).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("expected tx hash, got {}", result)))?;
        TxHash::from_hex(hash).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}
