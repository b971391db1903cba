/// Data Synchronization Layer
///
/// Everything that reads the chain or outside services:
///
/// - JSON-RPC access and Multicall3 batching
/// - Pool and token discovery per exchange
/// - Periodic reserve, capital and price refresh
/// - The pending transaction feed handed to the logic layer
pub mod config;
pub mod feed;
pub mod mock_chain;
pub mod multicall;
pub mod pool_loader;
pub mod prices;
pub mod refresh;
pub mod rpc;
pub mod token_cache;

pub use config::{BotConfig, CosmosConfig, ExchangeConfig};
pub use feed::{ChannelFeed, PendingFilterFeed, TransactionFeed};
pub use mock_chain::MockChainReader;
pub use multicall::MulticallManager;
pub use pool_loader::PoolLoader;
pub use prices::{DefiLlamaPriceFeed, PriceFeed};
pub use refresh::{CapitalCeiling, spawn_periodic, spawn_reserve_watcher};
pub use rpc::{ChainReader, RpcClient};
pub use token_cache::TokenCache;
