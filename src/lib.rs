// Three-Layer Architecture
pub mod data_sync; // Data Layer: chain reads, pool discovery, pending feed
pub mod execution; // Execution Layer: signing, bundling, relay submission
pub mod logic; // Logic Layer: projection, route search, optimal sizing

// Common utilities and types
pub mod utils;

// Re-export key components from each layer
pub use data_sync::{BotConfig, ChainReader, MulticallManager, PoolLoader, RpcClient, TransactionFeed};
pub use execution::{BundleRelay, ExecutionError, TransactionExecutor};
pub use logic::{
    Backrunner, Exchange, FeeModel, PendingTransaction, Pool, PoolWrapper, Quote, ReserveOverlay, Route, RouteGraph,
    Swap,
};
pub use utils::{Token, TokenWrapper};
