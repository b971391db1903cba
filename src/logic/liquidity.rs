use super::pool::PoolWrapper;
use ahash::HashMap;
use alloy_primitives::Address;

/// USD price per whole token
pub type TokenPrices = HashMap<Address, f64>;

/// USD value locked in the pool. One priced side counts twice, no priced side counts zero.
pub fn pool_liquidity_usd(pool: &PoolWrapper, prices: &TokenPrices) -> f64 {
    let reserves = pool.get_reserves();
    let value0 = prices.get(&pool.get_token0().get_address()).map(|price| pool.get_token0().to_float(reserves.reserve0) * price);
    let value1 = prices.get(&pool.get_token1().get_address()).map(|price| pool.get_token1().to_float(reserves.reserve1) * price);

    match (value0, value1) {
        (Some(value0), Some(value1)) => value0 + value1,
        (Some(value), None) | (None, Some(value)) => value * 2.0,
        (None, None) => 0.0,
    }
}

/// Pools worth more than `min_usd`
pub fn filter_liquid_pools(pools: &[PoolWrapper], prices: &TokenPrices, min_usd: f64) -> Vec<PoolWrapper> {
    pools.iter().filter(|pool| pool_liquidity_usd(pool, prices) > min_usd).cloned().collect()
}
