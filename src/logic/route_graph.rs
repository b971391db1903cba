use super::overlay::ReserveOverlay;
use super::pool::PoolWrapper;
use super::route::{Route, RouteHash, Swap};
use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use alloy_primitives::Address;
use std::sync::Arc;

/*
   Holds every cyclic route once, plus an index from pool address to the routes
   that trade through it. A route with three pools is listed under all three keys.
   Routes are immutable after insertion; a rebuild produces a new graph.
*/
#[derive(Clone, Debug, Default)]
pub struct RouteGraph {
    routes: Vec<Arc<Route>>,
    route_hashes: HashSet<RouteHash>,
    pool_routes: HashMap<Address, Vec<Arc<Route>>>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerates cycles through `base_token` and indexes them
    pub fn build(base_token: Address, min_hops: usize, max_hops: usize, pools: &[PoolWrapper]) -> Self {
        Self::from_routes(get_routes_from_pools(base_token, base_token, min_hops, max_hops, pools))
    }

    pub fn from_routes(routes: Vec<Route>) -> Self {
        let mut ret = Self::new();
        for route in routes {
            ret.add(route);
        }
        ret
    }

    /// Adds a route unless an identical one is already present
    pub fn add(&mut self, route: Route) -> bool {
        if !self.route_hashes.insert(route.route_hash) {
            return false;
        }
        let route = Arc::new(route);
        for pool in route.pools() {
            let entry = self.pool_routes.entry(pool).or_default();
            if !entry.iter().any(|r| r.route_hash == route.route_hash) {
                entry.push(route.clone());
            }
        }
        self.routes.push(route);
        true
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn pool_count(&self) -> usize {
        self.pool_routes.len()
    }

    pub fn get_pool_routes(&self, pool: &Address) -> &[Arc<Route>] {
        self.pool_routes.get(pool).map(Vec::as_slice).unwrap_or_default()
    }

    /// Routes through any pool of the overlay, each listed once
    pub fn routes_for_overlay(&self, overlay: &ReserveOverlay) -> Vec<Arc<Route>> {
        let mut seen = HashSet::new();
        let mut ret = Vec::new();
        for pool in overlay.pools() {
            for route in self.get_pool_routes(pool) {
                if seen.insert(route.route_hash) {
                    ret.push(route.clone());
                }
            }
        }
        ret
    }
}

/// Depth-first enumeration of routes from `token_in` to `token_out` with `min_hops..=max_hops` hops.
///
/// At each step every pool holding the frontier token that is not yet on the path is tried,
/// so no pool appears twice in a route. A path is accepted as soon as it reaches `token_out`
/// with at least `min_hops` hops and the search keeps extending it while depth remains.
pub fn get_routes_from_pools(
    token_in: Address,
    token_out: Address,
    min_hops: usize,
    max_hops: usize,
    pools: &[PoolWrapper],
) -> Vec<Route> {
    let mut pools_by_token: HashMap<Address, Vec<PoolWrapper>> = HashMap::new();
    for pool in pools {
        for token in pool.get_tokens() {
            pools_by_token.entry(token).or_default().push(pool.clone());
        }
    }

    let mut routes = Vec::new();
    let mut path = Vec::with_capacity(max_hops);
    collect_routes(&pools_by_token, token_in, token_out, min_hops, max_hops, &mut path, &mut routes);
    routes
}

fn collect_routes(
    pools_by_token: &HashMap<Address, Vec<PoolWrapper>>,
    frontier: Address,
    token_out: Address,
    min_hops: usize,
    depth_budget: usize,
    path: &mut Vec<Swap>,
    routes: &mut Vec<Route>,
) {
    if depth_budget == 0 {
        return;
    }
    let Some(candidates) = pools_by_token.get(&frontier) else {
        return;
    };

    for pool in candidates {
        if path.iter().any(|swap| swap.pool.get_address() == pool.get_address()) {
            continue;
        }
        let Some(zero_for_one) = pool.zero_for_one(frontier) else {
            continue;
        };

        let swap = Swap::new(pool.clone(), zero_for_one);
        let next = swap.token_out().get_address();
        path.push(swap);

        if next == token_out && path.len() >= min_hops {
            routes.push(Route::new(path.clone()));
        }
        collect_routes(pools_by_token, next, token_out, min_hops, depth_budget - 1, path, routes);

        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::amm::FeeModel;
    use crate::logic::pool::{Pool, Reserves};
    use crate::utils::Token;
    use alloy_primitives::U256;

    const A: u8 = 0x0a;
    const B: u8 = 0x0b;
    const C: u8 = 0x0c;

    fn pool(address: u8, token_a: u8, token_b: u8) -> PoolWrapper {
        Arc::new(Pool::new(
            Address::repeat_byte(address),
            "test",
            FeeModel::UNISWAP_V2,
            Arc::new(Token::repeat_byte(token_a)),
            Arc::new(Token::repeat_byte(token_b)),
            Reserves::new(U256::from(1000), U256::from(1000)),
        ))
    }

    fn pools() -> Vec<PoolWrapper> {
        vec![pool(0x01, A, B), pool(0x02, A, B), pool(0x03, B, C), pool(0x04, A, C), pool(0x05, B, 0x0d)]
    }

    #[test]
    fn test_routes_are_cycles_without_repeated_pools() {
        let base = Address::repeat_byte(A);
        let routes = get_routes_from_pools(base, base, 2, 3, &pools());

        assert_eq!(routes.len(), 6);
        for route in &routes {
            assert!((2..=3).contains(&route.len()));
            assert_eq!(route.token_in().unwrap().get_address(), base);
            assert_eq!(route.token_out().unwrap().get_address(), base);
            let unique: HashSet<Address> = route.pools().collect();
            assert_eq!(unique.len(), route.len());
            for pair in route.swaps.windows(2) {
                assert_eq!(pair[0].token_out(), pair[1].token_in());
            }
        }
    }

    #[test]
    fn test_hop_bounds() {
        let base = Address::repeat_byte(A);
        assert_eq!(get_routes_from_pools(base, base, 2, 2, &pools()).len(), 2);
        assert!(get_routes_from_pools(base, base, 3, 3, &pools()).iter().all(|r| r.len() == 3));
        assert_eq!(get_routes_from_pools(base, base, 3, 3, &pools()).len(), 4);
        assert!(get_routes_from_pools(Address::repeat_byte(0x0d), Address::repeat_byte(0x0d), 2, 3, &pools()).is_empty());
    }

    #[test]
    fn test_routes_grouped_by_pool() {
        let base = Address::repeat_byte(A);
        let graph = RouteGraph::build(base, 2, 3, &pools());

        assert_eq!(graph.len(), 6);
        assert_eq!(graph.get_pool_routes(&Address::repeat_byte(0x01)).len(), 4);
        assert_eq!(graph.get_pool_routes(&Address::repeat_byte(0x03)).len(), 4);
        assert_eq!(graph.get_pool_routes(&Address::repeat_byte(0x04)).len(), 4);
        assert!(graph.get_pool_routes(&Address::repeat_byte(0x05)).is_empty());
    }

    #[test]
    fn test_routes_for_overlay_are_unique() {
        let base = Address::repeat_byte(A);
        let graph = RouteGraph::build(base, 2, 3, &pools());

        let mut overlay = ReserveOverlay::default();
        overlay.insert(Address::repeat_byte(0x03), Reserves::default());
        overlay.insert(Address::repeat_byte(0x04), Reserves::default());

        // every 3-hop route crosses both pools
        assert_eq!(graph.routes_for_overlay(&overlay).len(), 4);
        assert!(graph.routes_for_overlay(&ReserveOverlay::default()).is_empty());
    }

    #[test]
    fn test_duplicate_routes_are_ignored() {
        let base = Address::repeat_byte(A);
        let routes = get_routes_from_pools(base, base, 2, 3, &pools());
        let mut graph = RouteGraph::from_routes(routes.clone());
        assert!(!graph.add(routes[0].clone()));
        assert_eq!(graph.len(), 6);
    }
}
