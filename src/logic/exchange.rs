use super::amm::FeeModel;
use super::pool_cache::PoolCache;
use alloy_primitives::Address;
use std::fmt::{Display, Formatter};

/// A Uniswap V2 deployment: router, factory, fee schedule and the pools discovered for it.
#[derive(Debug)]
pub struct Exchange {
    name: String,
    router: Address,
    factory: Address,
    wrapped_native: Address,
    fee: FeeModel,
    pools: PoolCache,
}

impl Display for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(router={:#})", self.name, self.router)
    }
}

impl Exchange {
    pub fn new(name: impl Into<String>, router: Address, factory: Address, wrapped_native: Address, fee: FeeModel) -> Self {
        Self { name: name.into(), router, factory, wrapped_native, fee, pools: PoolCache::new() }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_router(&self) -> Address {
        self.router
    }

    pub fn get_factory(&self) -> Address {
        self.factory
    }

    pub fn get_wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    pub fn get_fee(&self) -> FeeModel {
        self.fee
    }

    pub fn pools(&self) -> &PoolCache {
        &self.pools
    }
}
