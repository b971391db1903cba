use super::amm::FeeModel;
use super::overlay::ReserveOverlay;
use crate::utils::TokenWrapper;
use alloy_primitives::{Address, U256};
use arc_swap::ArcSwap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Reserves of a pair, positioned by token order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
}

impl Reserves {
    pub fn new(reserve0: U256, reserve1: U256) -> Self {
        Self { reserve0, reserve1 }
    }

    pub fn is_empty(&self) -> bool {
        self.reserve0.is_zero() && self.reserve1.is_zero()
    }

    /// `(reserve_in, reserve_out)` for a swap in the given direction
    pub fn oriented(&self, zero_for_one: bool) -> (U256, U256) {
        if zero_for_one { (self.reserve0, self.reserve1) } else { (self.reserve1, self.reserve0) }
    }

    /// Builds reserves back from `(reserve_in, reserve_out)`
    pub fn from_oriented(reserve_in: U256, reserve_out: U256, zero_for_one: bool) -> Self {
        if zero_for_one { Self::new(reserve_in, reserve_out) } else { Self::new(reserve_out, reserve_in) }
    }
}

/// A Uniswap V2 style pair.
///
/// Reserves are published through an [`ArcSwap`]; the refresh task replaces both
/// sides at once so readers never observe a half-updated pair.
#[derive(Debug)]
pub struct Pool {
    address: Address,
    exchange: Arc<str>,
    fee: FeeModel,
    token0: TokenWrapper,
    token1: TokenWrapper,
    reserves: ArcSwap<Reserves>,
}

pub type PoolWrapper = Arc<Pool>;

impl PartialEq for Pool {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Pool {}

impl Hash for Pool {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl Display for Pool {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}({}/{})", self.exchange, self.address, self.token0, self.token1)
    }
}

impl Pool {
    /// Tokens are stored address-ordered; reserves given for `token_a`/`token_b` follow them.
    pub fn new(
        address: Address,
        exchange: impl Into<Arc<str>>,
        fee: FeeModel,
        token_a: TokenWrapper,
        token_b: TokenWrapper,
        reserves: Reserves,
    ) -> Self {
        let (token0, token1, reserves) = if token_a.get_address() <= token_b.get_address() {
            (token_a, token_b, reserves)
        } else {
            (token_b, token_a, Reserves::new(reserves.reserve1, reserves.reserve0))
        };
        Self { address, exchange: exchange.into(), fee, token0, token1, reserves: ArcSwap::from_pointee(reserves) }
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    pub fn get_exchange(&self) -> &str {
        &self.exchange
    }

    pub fn get_fee(&self) -> FeeModel {
        self.fee
    }

    pub fn get_token0(&self) -> &TokenWrapper {
        &self.token0
    }

    pub fn get_token1(&self) -> &TokenWrapper {
        &self.token1
    }

    pub fn get_tokens(&self) -> [Address; 2] {
        [self.token0.get_address(), self.token1.get_address()]
    }

    /// Direction flag for a swap that sells `token_in`, `None` if the pool does not hold it
    pub fn zero_for_one(&self, token_in: Address) -> Option<bool> {
        if token_in == self.token0.get_address() {
            Some(true)
        } else if token_in == self.token1.get_address() {
            Some(false)
        } else {
            None
        }
    }

    /// Last refreshed reserves
    pub fn get_reserves(&self) -> Reserves {
        **self.reserves.load()
    }

    /// Replaces both reserves at once
    pub fn set_reserves(&self, reserves: Reserves) {
        self.reserves.store(Arc::new(reserves));
    }

    /// Overlay entry for this pool if present, authoritative reserves otherwise
    pub fn balances(&self, overlay: Option<&ReserveOverlay>) -> Reserves {
        overlay.and_then(|overlay| overlay.get(&self.address)).copied().unwrap_or_else(|| self.get_reserves())
    }

    /// Reserve held for `token`, overlay first
    pub fn balance_of(&self, token: Address, overlay: Option<&ReserveOverlay>) -> Option<U256> {
        let reserves = self.balances(overlay);
        self.zero_for_one(token).map(|zero_for_one| reserves.oriented(zero_for_one).0)
    }
}
