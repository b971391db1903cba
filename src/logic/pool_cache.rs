use super::pool::PoolWrapper;
use alloy_primitives::Address;
use dashmap::DashMap;

/// Pools of one exchange, looked up by pair address or by token pair in either order.
#[derive(Debug, Default)]
pub struct PoolCache {
    by_address: DashMap<Address, PoolWrapper>,
    by_tokens: DashMap<(Address, Address), PoolWrapper>,
}

impl PoolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached pool for the address, inserting `pool` if there is none
    pub fn get_or_insert(&self, pool: PoolWrapper) -> PoolWrapper {
        let pool = self.by_address.entry(pool.get_address()).or_insert(pool).clone();
        let [token0, token1] = pool.get_tokens();
        self.by_tokens.entry((token0, token1)).or_insert_with(|| pool.clone());
        self.by_tokens.entry((token1, token0)).or_insert_with(|| pool.clone());
        pool
    }

    pub fn get_by_address(&self, address: &Address) -> Option<PoolWrapper> {
        self.by_address.get(address).map(|entry| entry.value().clone())
    }

    pub fn get_by_tokens(&self, token_a: Address, token_b: Address) -> Option<PoolWrapper> {
        self.by_tokens.get(&(token_a, token_b)).map(|entry| entry.value().clone())
    }

    /// Point-in-time copy of every pool
    pub fn snapshot(&self) -> Vec<PoolWrapper> {
        self.by_address.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
