use super::overlay::ReserveOverlay;
use super::route::Route;
use super::solver::optimal_input_clamped;
use alloy_primitives::U256;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// A sized arbitrage on one route. Only built when `amount_out > amount_in`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub profit: U256,
    pub route: Arc<Route>,
}

impl Quote {
    pub fn new(route: Arc<Route>, amount_in: U256, amount_out: U256) -> Option<Self> {
        let profit = amount_out.checked_sub(amount_in).filter(|profit| !profit.is_zero())?;
        Some(Self { amount_in, amount_out, profit, route })
    }
}

/// Sizes a single route against the overlay: clamped optimal input, then a forward quote of that input
pub fn evaluate_route(route: &Arc<Route>, overlay: Option<&ReserveOverlay>, capital: U256) -> Option<Quote> {
    let amount_in = optimal_input_clamped(route, overlay, capital);
    if amount_in.is_zero() {
        return None;
    }
    match route.get_amount_out(amount_in, overlay) {
        Ok(amount_out) => Quote::new(route.clone(), amount_in, amount_out),
        Err(e) => {
            trace!(route = %route.route_hash, "route quote failed: {}", e);
            None
        }
    }
}

/// Evaluates all routes in parallel and keeps the strictly most profitable quote.
pub fn find_best_quote(routes: &[Arc<Route>], overlay: Option<&ReserveOverlay>, capital: U256) -> Option<Quote> {
    let best: Mutex<Option<Quote>> = Mutex::new(None);

    routes.par_iter().for_each(|route| {
        let Some(quote) = evaluate_route(route, overlay, capital) else {
            return;
        };
        let mut best = best.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if best.as_ref().is_none_or(|current| quote.profit > current.profit) {
            *best = Some(quote);
        }
    });

    best.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::amm::FeeModel;
    use crate::logic::pool::{Pool, PoolWrapper, Reserves};
    use crate::logic::route::Swap;
    use crate::utils::Token;
    use alloy_primitives::Address;

    fn pool(address: u8, reserve0: u64, reserve1: u64) -> PoolWrapper {
        Arc::new(Pool::new(
            Address::repeat_byte(address),
            "test",
            FeeModel::UNISWAP_V2,
            Arc::new(Token::repeat_byte(0x01)),
            Arc::new(Token::repeat_byte(0x02)),
            Reserves::new(U256::from(reserve0), U256::from(reserve1)),
        ))
    }

    fn two_hop(p1: &PoolWrapper, p2: &PoolWrapper) -> Arc<Route> {
        Arc::new(Route::new(vec![Swap::new(p1.clone(), true), Swap::new(p2.clone(), false)]))
    }

    #[test]
    fn test_quote_requires_profit() {
        let route = Arc::new(Route::default());
        assert!(Quote::new(route.clone(), U256::from(10), U256::from(10)).is_none());
        assert!(Quote::new(route.clone(), U256::from(10), U256::from(9)).is_none());
        assert_eq!(Quote::new(route, U256::from(10), U256::from(12)).unwrap().profit, U256::from(2));
    }

    #[test]
    fn test_golden_quote() {
        let route = two_hop(&pool(0x10, 100_000, 100_000), &pool(0x11, 120_000, 100_000));
        let quote = evaluate_route(&route, None, U256::MAX).unwrap();
        assert_eq!(quote.amount_in, U256::from(4628));
        assert_eq!(quote.amount_out, U256::from(5053));
        assert_eq!(quote.profit, U256::from(425));
    }

    #[test]
    fn test_clamped_input_is_requoted() {
        let route = two_hop(&pool(0x10, 100_000, 100_000), &pool(0x11, 120_000, 100_000));
        let quote = evaluate_route(&route, None, U256::from(1000)).unwrap();
        assert_eq!(quote.amount_in, U256::from(1000));
        assert_eq!(quote.amount_out, route.get_amount_out(U256::from(1000), None).unwrap());
        assert!(evaluate_route(&route, None, U256::ZERO).is_none());
    }

    #[test]
    fn test_unprofitable_route_yields_nothing() {
        let route = two_hop(&pool(0x10, 100_000, 100_000), &pool(0x11, 100_000, 100_000));
        assert!(evaluate_route(&route, None, U256::MAX).is_none());
        assert!(find_best_quote(&[route], None, U256::MAX).is_none());
    }

    #[test]
    fn test_best_quote_wins() {
        let p1 = pool(0x10, 100_000, 100_000);
        let small = two_hop(&p1, &pool(0x11, 110_000, 100_000));
        let large = two_hop(&p1, &pool(0x12, 150_000, 100_000));
        let flat = two_hop(&p1, &pool(0x13, 100_000, 100_000));

        let routes = vec![small.clone(), flat, large.clone(), small];
        let best = find_best_quote(&routes, None, U256::MAX).unwrap();
        assert_eq!(best.route.route_hash, large.route_hash);
        assert_eq!(best, evaluate_route(&large, None, U256::MAX).unwrap());
    }
}
