use crate::logic::amm::{AmmError, FeeModel};
use crate::utils::config_loader::{LoadConfigError, load_from_file, parse_config};
use crate::utils::constants::{
    BACKRUN_GAS_LIMIT, BECH32_PREFIX, COSMOS_CHAIN_ID, DEFAULT_FEE, DEFAULT_FEE_BASE, MULTICALL3, NATIVE_DENOM,
    PAYMENT_FEE_AMOUNT, PAYMENT_GAS_LIMIT, WEVMOS,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// A Uniswap V2 deployment to watch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    pub router: Address,
    pub factory: Address,
    #[serde(default = "default_fee")]
    pub fee: u64,
    #[serde(default = "default_fee_base")]
    pub fee_base: u64,
    /// Used when the router does not answer `WETH()`
    #[serde(default)]
    pub wrapped_native: Option<Address>,
}

fn default_fee() -> u64 {
    DEFAULT_FEE
}

fn default_fee_base() -> u64 {
    DEFAULT_FEE_BASE
}

impl ExchangeConfig {
    pub fn fee_model(&self) -> Result<FeeModel, AmmError> {
        FeeModel::new(U256::from(self.fee), U256::from(self.fee_base))
    }
}

/// Parameters of the Cosmos side payment transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CosmosConfig {
    pub chain_id: String,
    pub bech32_prefix: String,
    pub denom: String,
    pub gas_limit: u64,
    pub fee_amount: String,
}

impl Default for CosmosConfig {
    fn default() -> Self {
        Self {
            chain_id: COSMOS_CHAIN_ID.to_string(),
            bech32_prefix: BECH32_PREFIX.to_string(),
            denom: NATIVE_DENOM.to_string(),
            gas_limit: PAYMENT_GAS_LIMIT,
            fee_amount: PAYMENT_FEE_AMOUNT.to_string(),
        }
    }
}

/// Bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// EVM JSON-RPC endpoint
    pub eth_rpc: String,
    /// Cosmos REST endpoint used for account lookups
    pub cosmos_rest: String,
    /// Bundle relay JSON-RPC endpoint
    pub relay_url: String,
    pub base_token: Address,
    /// Multihop contract holding the trading capital
    pub capital_address: Address,
    /// Bech32 address receiving the bid
    pub auction_house_address: String,
    /// Decimal or `0x` hex amount of base token
    pub min_profit_wei: String,
    /// Share of the profit paid as the bid, 0..=1
    pub bid_fraction: f64,
    pub poll_ms: u64,
    pub reserve_refresh_ms: u64,
    pub capital_refresh_secs: u64,
    pub account_refresh_secs: u64,
    pub refresh_retry_ms: u64,
    pub http_timeout_secs: u64,
    pub backrun_gas_limit: u64,
    pub min_liquidity_usd: f64,
    pub pool_batch_size: usize,
    pub max_concurrent_batches: usize,
    pub min_route_hops: usize,
    pub max_route_hops: usize,
    pub multicall_address: Address,
    /// Chain key of the price API
    pub price_chain: String,
    pub price_api_url: String,
    pub cosmos: CosmosConfig,
    pub exchanges: Vec<ExchangeConfig>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            eth_rpc: "http://localhost:8545".to_string(),
            cosmos_rest: "http://localhost:1317".to_string(),
            relay_url: "http://localhost:26657".to_string(),
            base_token: WEVMOS,
            capital_address: Address::ZERO,
            auction_house_address: String::new(),
            min_profit_wei: "0".to_string(),
            bid_fraction: 0.5,
            poll_ms: 100,
            reserve_refresh_ms: 100,
            capital_refresh_secs: 5,
            account_refresh_secs: 5,
            refresh_retry_ms: 1000,
            http_timeout_secs: 10,
            backrun_gas_limit: BACKRUN_GAS_LIMIT,
            min_liquidity_usd: 1.0,
            pool_batch_size: 500,
            max_concurrent_batches: 5,
            min_route_hops: 2,
            max_route_hops: 3,
            multicall_address: MULTICALL3,
            price_chain: "evmos".to_string(),
            price_api_url: "https://coins.llama.fi".to_string(),
            cosmos: CosmosConfig::default(),
            exchanges: Vec::new(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, target: &mut T) -> eyre::Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value.parse().map_err(|e| eyre::eyre!("Invalid {}: {}", name, e))?;
    }
    Ok(())
}

fn url_env(name: &str, target: &mut String) -> eyre::Result<()> {
    if let Ok(value) = std::env::var(name) {
        Url::parse(&value).map_err(|e| eyre::eyre!("Invalid {}: {}", name, e))?;
        *target = value;
    }
    Ok(())
}

impl BotConfig {
    /// Loads and validates a TOML file
    pub async fn load(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError> {
        let config: BotConfig = load_from_file(file_name).await?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, LoadConfigError> {
        let config: BotConfig = parse_config(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration overridden by environment variables. Exchanges come from the file only.
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        url_env("ETH_RPC", &mut config.eth_rpc)?;
        url_env("COSMOS_REST", &mut config.cosmos_rest)?;
        url_env("RELAY_URL", &mut config.relay_url)?;
        parse_env("BASE_TOKEN", &mut config.base_token)?;
        parse_env("CAPITAL_ADDRESS", &mut config.capital_address)?;
        parse_env("AUCTION_HOUSE_ADDRESS", &mut config.auction_house_address)?;
        parse_env("MIN_PROFIT_WEI", &mut config.min_profit_wei)?;
        parse_env("BID_FRACTION", &mut config.bid_fraction)?;
        parse_env("POLL_MS", &mut config.poll_ms)?;
        parse_env("MIN_LIQUIDITY_USD", &mut config.min_liquidity_usd)?;
        parse_env("MULTICALL_ADDRESS", &mut config.multicall_address)?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LoadConfigError> {
        if self.min_route_hops < 2 || self.max_route_hops > 3 || self.min_route_hops > self.max_route_hops {
            return Err(LoadConfigError::ConfigError(format!(
                "route hops must lie within [2, 3], got [{}, {}]",
                self.min_route_hops, self.max_route_hops
            )));
        }
        if !(0.0..=1.0).contains(&self.bid_fraction) {
            return Err(LoadConfigError::ConfigError(format!("bid_fraction {} outside [0, 1]", self.bid_fraction)));
        }
        if self.exchanges.is_empty() {
            return Err(LoadConfigError::ConfigError("no exchanges configured".to_string()));
        }
        if self.pool_batch_size == 0 || self.max_concurrent_batches == 0 {
            return Err(LoadConfigError::ConfigError("pool batch size and concurrency must be positive".to_string()));
        }
        for exchange in &self.exchanges {
            exchange.fee_model().map_err(|e| LoadConfigError::ConfigError(format!("exchange {}: {}", exchange.name, e)))?;
        }
        self.min_profit()?;
        Ok(())
    }

    pub fn min_profit(&self) -> Result<U256, LoadConfigError> {
        U256::from_str(self.min_profit_wei.trim())
            .map_err(|e| LoadConfigError::ConfigError(format!("min_profit_wei {}: {}", self.min_profit_wei, e)))
    }

    /// Bid share in parts per million
    pub fn bid_ppm(&self) -> u64 {
        (self.bid_fraction.clamp(0.0, 1.0) * 1_000_000.0).round() as u64
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn reserve_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.reserve_refresh_ms)
    }

    pub fn capital_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.capital_refresh_secs)
    }

    pub fn account_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.account_refresh_secs)
    }

    pub fn refresh_retry_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_retry_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
