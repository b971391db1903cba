use super::multicall::MulticallManager;
use crate::logic::pool::PoolWrapper;
use alloy_primitives::{Address, U256};
use arc_swap::ArcSwap;
use eyre::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Runs `tick` forever: after a success it sleeps `interval`, after a failure `retry_delay`.
pub fn spawn_periodic<F, Fut>(name: String, interval: Duration, retry_delay: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match tick().await {
                Ok(()) => tokio::time::sleep(interval).await,
                Err(e) => {
                    warn!("{} refresh failed: {}", name, e);
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    })
}

/// Keeps one pool's reserves current
pub fn spawn_reserve_watcher(pool: PoolWrapper, multicall: MulticallManager, interval: Duration, retry_delay: Duration) -> JoinHandle<()> {
    let name = format!("reserves of {}", pool.get_address());
    spawn_periodic(name, interval, retry_delay, move || {
        let pool = pool.clone();
        let multicall = multicall.clone();
        async move {
            let reserves = multicall.get_reserves(pool.get_address()).await?;
            pool.set_reserves(reserves);
            Ok(())
        }
    })
}

/// Base token balance of the capital contract, the upper bound for any backrun input
#[derive(Debug)]
pub struct CapitalCeiling {
    base_token: Address,
    holder: Address,
    amount: ArcSwap<U256>,
}

impl CapitalCeiling {
    pub fn new(base_token: Address, holder: Address) -> Self {
        Self { base_token, holder, amount: ArcSwap::from_pointee(U256::ZERO) }
    }

    pub fn get(&self) -> U256 {
        **self.amount.load()
    }

    pub fn set(&self, amount: U256) {
        self.amount.store(Arc::new(amount));
    }

    pub async fn refresh(&self, multicall: &MulticallManager) -> Result<U256> {
        let amount = multicall.balance_of(self.base_token, self.holder).await?;
        self.set(amount);
        debug!(%amount, holder = %self.holder, "Capital refreshed");
        Ok(amount)
    }

    pub fn spawn(self: &Arc<Self>, multicall: MulticallManager, interval: Duration, retry_delay: Duration) -> JoinHandle<()> {
        let ceiling = self.clone();
        spawn_periodic("capital".to_string(), interval, retry_delay, move || {
            let ceiling = ceiling.clone();
            let multicall = multicall.clone();
            async move { ceiling.refresh(&multicall).await.map(|_| ()) }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::mock_chain::MockChainReader;
    use crate::data_sync::multicall::{IERC20, IUniswapV2Pair};
    use crate::logic::amm::FeeModel;
    use crate::logic::pool::{Pool, Reserves};
    use crate::utils::Token;
    use alloy_primitives::aliases::U112;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MULTICALL: Address = Address::repeat_byte(0xca);

    #[tokio::test]
    async fn test_periodic_retries_after_failure() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let handle = spawn_periodic("test".to_string(), Duration::from_millis(1), Duration::from_millis(1), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) % 2 == 0 { Err(eyre::eyre!("flaky")) } else { Ok(()) }
            }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_reserve_watcher_updates_pool() {
        let chain = Arc::new(MockChainReader::new(MULTICALL));
        let pool = Arc::new(Pool::new(
            Address::repeat_byte(0x01),
            "test",
            FeeModel::UNISWAP_V2,
            Arc::new(Token::repeat_byte(0x0a)),
            Arc::new(Token::repeat_byte(0x0b)),
            Reserves::new(U256::from(1), U256::from(1)),
        ));
        chain.set_call_return(
            pool.get_address(),
            &IUniswapV2Pair::getReservesCall {},
            &IUniswapV2Pair::getReservesReturn { reserve0: U112::from(500), reserve1: U112::from(700), blockTimestampLast: 1 },
        );

        let handle = spawn_reserve_watcher(
            pool.clone(),
            MulticallManager::new(MULTICALL, chain),
            Duration::from_millis(1),
            Duration::from_millis(1),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert_eq!(pool.get_reserves(), Reserves::new(U256::from(500), U256::from(700)));
    }

    #[tokio::test]
    async fn test_capital_refresh() -> Result<()> {
        let chain = Arc::new(MockChainReader::new(MULTICALL));
        let base = Address::repeat_byte(0x0a);
        let holder = Address::repeat_byte(0xcc);
        chain.set_call_return(base, &IERC20::balanceOfCall { owner: holder }, &U256::from(12345));

        let ceiling = CapitalCeiling::new(base, holder);
        assert_eq!(ceiling.get(), U256::ZERO);
        ceiling.refresh(&MulticallManager::new(MULTICALL, chain.clone())).await?;
        assert_eq!(ceiling.get(), U256::from(12345));

        chain.remove_call(base, &IERC20::balanceOfCall { owner: holder });
        assert!(ceiling.refresh(&MulticallManager::new(MULTICALL, chain)).await.is_err());
        assert_eq!(ceiling.get(), U256::from(12345));
        Ok(())
    }
}
