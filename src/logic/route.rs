use super::amm::AmmError;
use super::overlay::ReserveOverlay;
use super::pool::PoolWrapper;
use crate::utils::TokenWrapper;
use alloy_primitives::{Address, U256, hex};
use sha2::digest::Update;
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

/// Stable identifier of a route: sha256 over every hop's pool address and direction
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct RouteHash(pub [u8; 32]);

impl Display for RouteHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode_prefixed(self.0))
    }
}

impl Debug for RouteHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RouteHash({})", hex::encode_prefixed(self.0))
    }
}

/// One hop through a pool
#[derive(Clone, Debug)]
pub struct Swap {
    pub pool: PoolWrapper,
    pub zero_for_one: bool,
}

impl Swap {
    pub fn new(pool: PoolWrapper, zero_for_one: bool) -> Self {
        Self { pool, zero_for_one }
    }

    pub fn token_in(&self) -> &TokenWrapper {
        if self.zero_for_one { self.pool.get_token0() } else { self.pool.get_token1() }
    }

    pub fn token_out(&self) -> &TokenWrapper {
        if self.zero_for_one { self.pool.get_token1() } else { self.pool.get_token0() }
    }

    /// `(reserve_in, reserve_out)` for this hop, overlay first
    pub fn reserves(&self, overlay: Option<&ReserveOverlay>) -> (U256, U256) {
        self.pool.balances(overlay).oriented(self.zero_for_one)
    }

    pub fn get_amount_out(&self, amount_in: U256, overlay: Option<&ReserveOverlay>) -> Result<U256, AmmError> {
        let (reserve_in, reserve_out) = self.reserves(overlay);
        self.pool.get_fee().get_amount_out(amount_in, reserve_in, reserve_out)
    }
}

impl PartialEq for Swap {
    fn eq(&self, other: &Self) -> bool {
        self.pool.get_address() == other.pool.get_address() && self.zero_for_one == other.zero_for_one
    }
}

impl Eq for Swap {}

/// Ordered hops where each hop's input token is the previous hop's output token
#[derive(Clone, Debug, Default)]
pub struct Route {
    pub route_hash: RouteHash,
    pub swaps: Vec<Swap>,
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hops: Vec<String> =
            self.swaps.iter().map(|s| format!("{}-[{:#}]->{}", s.token_in(), s.pool.get_address(), s.token_out())).collect();
        write!(f, "Route({})", hops.join(" "))
    }
}

impl Route {
    pub fn new(swaps: Vec<Swap>) -> Self {
        let route_hash = generate_route_hash(&swaps);
        Route { route_hash, swaps }
    }

    pub fn len(&self) -> usize {
        self.swaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    pub fn token_in(&self) -> Option<&TokenWrapper> {
        self.swaps.first().map(Swap::token_in)
    }

    pub fn token_out(&self) -> Option<&TokenWrapper> {
        self.swaps.last().map(Swap::token_out)
    }

    pub fn contains_pool(&self, pool: &Address) -> bool {
        self.swaps.iter().any(|swap| swap.pool.get_address() == *pool)
    }

    pub fn pools(&self) -> impl Iterator<Item = Address> + '_ {
        self.swaps.iter().map(|swap| swap.pool.get_address())
    }

    /// Chains forward quotes through every hop using overlay-aware reserves
    pub fn get_amount_out(&self, amount_in: U256, overlay: Option<&ReserveOverlay>) -> Result<U256, AmmError> {
        self.swaps.iter().try_fold(amount_in, |amount, swap| swap.get_amount_out(amount, overlay))
    }
}

impl Hash for Route {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.route_hash.hash(state);
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.swaps == other.swaps
    }
}

impl Eq for Route {}

pub fn generate_route_hash(swaps: &[Swap]) -> RouteHash {
    let mut hasher = Sha256::new();
    for swap in swaps {
        Update::update(&mut hasher, swap.pool.get_address().as_slice());
        Update::update(&mut hasher, &[swap.zero_for_one as u8]);
    }
    let hash_slice: [u8; 32] = hasher.finalize().into();
    RouteHash(hash_slice)
}
