use super::config::ExchangeConfig;
use super::multicall::{IUniswapV2Factory, IUniswapV2Pair, MulticallManager};
use super::token_cache::TokenCache;
use crate::logic::exchange::Exchange;
use crate::logic::pool::{Pool, PoolWrapper, Reserves};
use crate::logic::router::IUniswapV2Router02;
use crate::utils::constants::WEVMOS;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use eyre::{Result, eyre};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Discovers the pairs of each exchange's factory
#[derive(Clone)]
pub struct PoolLoader {
    multicall: MulticallManager,
    tokens: Arc<TokenCache>,
    batch_size: usize,
    max_concurrent_batches: usize,
}

impl PoolLoader {
    pub fn new(multicall: MulticallManager, tokens: Arc<TokenCache>, batch_size: usize, max_concurrent_batches: usize) -> Self {
        Self { multicall, tokens, batch_size: batch_size.max(1), max_concurrent_batches: max_concurrent_batches.max(1) }
    }

    /// Builds the exchange, asking the router for its wrapped native token
    pub async fn connect_exchange(&self, config: &ExchangeConfig) -> Result<Arc<Exchange>> {
        let fee = config.fee_model()?;
        let data = IUniswapV2Router02::WETHCall {}.abi_encode();
        let wrapped_native = match self.multicall.reader().call(config.router, data.into()).await {
            Ok(response) => IUniswapV2Router02::WETHCall::abi_decode_returns(&response)?,
            Err(e) => {
                let fallback = config.wrapped_native.unwrap_or(WEVMOS);
                warn!("Router {} did not answer WETH(), using {}: {}", config.router, fallback, e);
                fallback
            }
        };
        Ok(Arc::new(Exchange::new(config.name.clone(), config.router, config.factory, wrapped_native, fee)))
    }

    /// `allPairsLength()`, or `totalPairs()` for factories that only expose that
    pub async fn pair_count(&self, factory: Address) -> Result<usize> {
        let calls = vec![
            MulticallManager::prepare_call(factory, &IUniswapV2Factory::allPairsLengthCall {}),
            MulticallManager::prepare_call(factory, &IUniswapV2Factory::totalPairsCall {}),
        ];
        let results = self.multicall.aggregate3(calls).await?;
        let count = MulticallManager::decode_result::<IUniswapV2Factory::allPairsLengthCall>(&results[0])
            .or_else(|| MulticallManager::decode_result::<IUniswapV2Factory::totalPairsCall>(&results[1]))
            .ok_or_else(|| eyre!("Factory {} reports no pair count", factory))?;
        usize::try_from(count).map_err(|_| eyre!("Factory {} pair count {} out of range", factory, count))
    }

    /// Loads every pair of the exchange into its pool cache. Returns the number of pools loaded.
    pub async fn load_exchange(&self, exchange: &Arc<Exchange>) -> Result<usize> {
        let pair_count = self.pair_count(exchange.get_factory()).await?;
        info!("Loading {} pairs of {}", pair_count, exchange);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_batches));
        let mut tasks = JoinSet::new();
        for start in (0..pair_count).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(pair_count);
            let permit = semaphore.clone().acquire_owned().await?;
            let loader = self.clone();
            let exchange = exchange.clone();
            tasks.spawn(async move {
                let _permit = permit;
                loader.load_batch(&exchange, start, end).await
            });
        }

        let mut loaded = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Ok(count)) => loaded += count,
                Ok(Err(e)) => warn!("Pair batch of {} failed: {}", exchange, e),
                Err(e) => warn!("Pair batch task of {} failed: {}", exchange, e),
            }
        }
        info!("Loaded {} pools of {}", loaded, exchange);
        Ok(loaded)
    }

    async fn load_batch(&self, exchange: &Exchange, start: usize, end: usize) -> Result<usize> {
        let calls = (start..end)
            .map(|index| MulticallManager::prepare_call(exchange.get_factory(), &IUniswapV2Factory::allPairsCall { index: U256::from(index) }))
            .collect();
        let pairs: Vec<Address> = self
            .multicall
            .aggregate3(calls)
            .await?
            .iter()
            .filter_map(MulticallManager::decode_result::<IUniswapV2Factory::allPairsCall>)
            .collect();

        let results = join_all(pairs.iter().map(|pair| self.load_pool(exchange, *pair))).await;
        let mut loaded = 0;
        for (pair, result) in pairs.iter().zip(results) {
            match result {
                Ok(Some(_)) => loaded += 1,
                Ok(None) => debug!("Skipping pair {} of foreign factory", pair),
                Err(e) => debug!("Skipping pair {}: {}", pair, e),
            }
        }
        debug!("Pairs {}..{} of {}: {} loaded", start, end, exchange, loaded);
        Ok(loaded)
    }

    /// Reads factory, tokens and reserves of a pair in one batch.
    /// Pairs created by another factory give `None`.
    pub async fn load_pool(&self, exchange: &Exchange, pair: Address) -> Result<Option<PoolWrapper>> {
        if let Some(pool) = exchange.pools().get_by_address(&pair) {
            return Ok(Some(pool));
        }

        let calls = vec![
            MulticallManager::prepare_call(pair, &IUniswapV2Pair::factoryCall {}),
            MulticallManager::prepare_call(pair, &IUniswapV2Pair::token0Call {}),
            MulticallManager::prepare_call(pair, &IUniswapV2Pair::token1Call {}),
            MulticallManager::prepare_call(pair, &IUniswapV2Pair::getReservesCall {}),
        ];
        let results = self.multicall.aggregate3(calls).await?;

        let factory = MulticallManager::decode_result::<IUniswapV2Pair::factoryCall>(&results[0])
            .ok_or_else(|| eyre!("Pair {} has no factory", pair))?;
        if factory != exchange.get_factory() {
            return Ok(None);
        }
        let token0 = MulticallManager::decode_result::<IUniswapV2Pair::token0Call>(&results[1])
            .ok_or_else(|| eyre!("Pair {} has no token0", pair))?;
        let token1 = MulticallManager::decode_result::<IUniswapV2Pair::token1Call>(&results[2])
            .ok_or_else(|| eyre!("Pair {} has no token1", pair))?;
        let reserves = MulticallManager::decode_result::<IUniswapV2Pair::getReservesCall>(&results[3])
            .ok_or_else(|| eyre!("Pair {} has no reserves", pair))?;

        let token0 = self.tokens.get_or_fetch(token0).await?;
        let token1 = self.tokens.get_or_fetch(token1).await?;
        let pool = Pool::new(
            pair,
            exchange.get_name(),
            exchange.get_fee(),
            token0,
            token1,
            Reserves::new(U256::from(reserves.reserve0), U256::from(reserves.reserve1)),
        );
        Ok(Some(exchange.pools().get_or_insert(Arc::new(pool))))
    }
}
