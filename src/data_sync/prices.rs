use crate::logic::liquidity::TokenPrices;
use alloy_primitives::Address;
use async_trait::async_trait;
use eyre::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// USD prices per whole token
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Tokens without a known price are left out
    async fn prices(&self, tokens: &[Address]) -> Result<TokenPrices>;
}

#[derive(Debug, Deserialize)]
struct CoinPrice {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    #[serde(default)]
    coins: HashMap<String, CoinPrice>,
}

/// `coins.llama.fi` current prices
#[derive(Debug, Clone)]
pub struct DefiLlamaPriceFeed {
    http_client: reqwest::Client,
    base_url: String,
    chain: String,
    chunk_size: usize,
}

impl DefiLlamaPriceFeed {
    pub fn new(base_url: impl Into<String>, chain: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client, base_url: base_url.into(), chain: chain.into(), chunk_size: 100 })
    }

    pub fn prices_url(&self, tokens: &[Address]) -> String {
        let coins: Vec<String> = tokens.iter().map(|token| format!("{}:{:#x}", self.chain, token)).collect();
        format!("{}/prices/current/{}", self.base_url.trim_end_matches('/'), coins.join(","))
    }

    fn parse_prices(&self, body: &str) -> Result<TokenPrices> {
        let response: PricesResponse = serde_json::from_str(body)?;
        let prefix = format!("{}:", self.chain);
        Ok(response
            .coins
            .into_iter()
            .filter_map(|(key, coin)| {
                let address: Address = key.strip_prefix(&prefix)?.parse().ok()?;
                Some((address, coin.price))
            })
            .collect())
    }
}

#[async_trait]
impl PriceFeed for DefiLlamaPriceFeed {
    async fn prices(&self, tokens: &[Address]) -> Result<TokenPrices> {
        let mut prices = TokenPrices::default();
        for chunk in tokens.chunks(self.chunk_size) {
            let body = self.http_client.get(self.prices_url(chunk)).send().await?.error_for_status()?.text().await?;
            prices.extend(self.parse_prices(&body)?);
        }
        debug!("Priced {} of {} tokens", prices.len(), tokens.len());
        Ok(prices)
    }
}
