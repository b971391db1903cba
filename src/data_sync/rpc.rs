use alloy_primitives::{Address, B256, Bytes, U64, U128};
use async_trait::async_trait;
use eyre::{Result, eyre};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Read access to the EVM chain
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Nonce of `address` at the latest block
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn chain_id(&self) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Plain JSON-RPC over HTTP
#[derive(Debug)]
pub struct RpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    id: AtomicU64,
}

impl RpcClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, rpc_url: rpc_url.into(), id: AtomicU64::new(1) })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.id.fetch_add(1, Ordering::Relaxed),
        });

        let response: RpcResponse =
            self.http_client.post(&self.rpc_url).header("Content-Type", "application/json").json(&request_body).send().await?.json().await?;

        if let Some(error) = response.error {
            return Err(eyre!("RPC error in {}: {}", method, error));
        }
        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| eyre!("Cannot decode {} result: {}", method, e))
    }

    pub async fn gas_price(&self) -> Result<u128> {
        let price: U128 = self.request("eth_gasPrice", json!([])).await?;
        Ok(price.to())
    }

    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256> {
        self.request("eth_sendRawTransaction", json!([raw])).await
    }

    /// Installs a pending transaction filter and returns its id
    pub async fn new_pending_transaction_filter(&self) -> Result<String> {
        self.request("eth_newPendingTransactionFilter", json!([])).await
    }

    /// Hashes seen by the filter since the previous poll
    pub async fn get_filter_changes(&self, filter_id: &str) -> Result<Vec<B256>> {
        self.request("eth_getFilterChanges", json!([filter_id])).await
    }

    /// `None` once the transaction has left the mempool
    pub async fn get_raw_transaction_by_hash(&self, hash: B256) -> Result<Option<Bytes>> {
        self.request("eth_getRawTransactionByHash", json!([hash])).await
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"])).await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        let count: U64 = self.request("eth_getTransactionCount", json!([address, "latest"])).await?;
        Ok(count.to())
    }

    async fn chain_id(&self) -> Result<u64> {
        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(chain_id.to())
    }
}
