use super::bundle::SignedBundle;
use async_trait::async_trait;
use eyre::{Result, eyre};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// Outcome reported by the relay for one bundle
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SendBundleResult {
    pub auction_fee: String,
    pub code: i64,
    pub bundle_size: String,
    pub desired_height: String,
    pub error: String,
    pub result_check_txs: Value,
    pub result_deliver_txs: Value,
    pub simulation_success: bool,
    pub txs: Value,
    pub waited_for_simulation_results: bool,
}

impl SendBundleResult {
    /// Non-zero codes are rejections
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Deserialize)]
struct SendBundleResponse {
    #[serde(default)]
    result: Option<SendBundleResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[async_trait]
pub trait BundleRelay: Send + Sync {
    async fn send_bundle(&self, bundle: &SignedBundle) -> Result<SendBundleResult>;
}

/// `broadcast_bundle_sync` JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct SkipRelayClient {
    http_client: reqwest::Client,
    relay_url: String,
}

impl SkipRelayClient {
    pub fn new(relay_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, relay_url: relay_url.into() })
    }

    pub fn request_body(bundle: &SignedBundle) -> Value {
        json!({
            "jsonrpc": "2.0",
            "method": "broadcast_bundle_sync",
            "params": [
                bundle.transactions,
                bundle.desired_height.to_string(),
                bundle.public_key,
                bundle.signature,
            ],
            "id": 1,
        })
    }

    fn parse_response(body: &str) -> Result<SendBundleResult> {
        let response: SendBundleResponse = serde_json::from_str(body)?;
        if let Some(error) = response.error {
            return Err(eyre!("Relay error: {}", error));
        }
        response.result.ok_or_else(|| eyre!("Relay response has no result"))
    }
}

#[async_trait]
impl BundleRelay for SkipRelayClient {
    async fn send_bundle(&self, bundle: &SignedBundle) -> Result<SendBundleResult> {
        let body = self
            .http_client
            .post(&self.relay_url)
            .header("Content-Type", "application/json")
            .json(&Self::request_body(bundle))
            .send()
            .await?
            .text()
            .await?;
        Self::parse_response(&body)
    }
}
