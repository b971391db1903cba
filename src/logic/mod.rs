/// Logic Layer - Backrun Engine
///
/// This layer is responsible for:
/// - Constant-product pricing and the closed-form optimal input
/// - Projecting a pending router call onto pool reserves
/// - Cyclic route enumeration around the base token
/// - Parallel best-quote search over the routes a transaction touches
pub mod amm;
pub mod backrunner;
pub mod exchange;
pub mod liquidity;
pub mod overlay;
pub mod pool;
pub mod pool_cache;
pub mod projector;
pub mod quote;
pub mod route;
pub mod route_graph;
pub mod router;
pub mod solver;
pub mod types;

pub use amm::{AmmError, FeeModel};
pub use backrunner::{AnalysisError, BackrunParams, Backrunner};
pub use exchange::Exchange;
pub use liquidity::{TokenPrices, filter_liquid_pools, pool_liquidity_usd};
pub use overlay::ReserveOverlay;
pub use pool::{Pool, PoolWrapper, Reserves};
pub use pool_cache::PoolCache;
pub use projector::{ProjectionError, project, project_calldata};
pub use quote::{Quote, evaluate_route, find_best_quote};
pub use route::{Route, RouteHash, Swap};
pub use route_graph::{RouteGraph, get_routes_from_pools};
pub use router::{RouterCall, RouterMethod};
pub use solver::{effective_reserves, optimal_amount_in, optimal_input, optimal_input_clamped};
pub use types::{GasPricing, PendingTransaction};
