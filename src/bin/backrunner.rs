use ahash::HashSet;
use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use backrun_path::data_sync::{
    BotConfig, CapitalCeiling, ChainReader, DefiLlamaPriceFeed, MulticallManager, PendingFilterFeed, PoolLoader, PriceFeed,
    RpcClient, TokenCache, spawn_reserve_watcher,
};
use backrun_path::execution::{
    AccountWatcher, CosmosKey, CosmosPaymentSigner, EvmBackrunSigner, SkipRelayClient, TransactionExecutor,
};
use backrun_path::logic::{BackrunParams, Backrunner, filter_liquid_pools};
use backrun_path::utils::WITHDRAW_GAS_LIMIT;
use clap::{Parser, Subcommand};
use eyre::{Result, eyre};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "backrunner", about = "Pending-mempool backrun arbitrage for Evmos")]
struct Cli {
    /// TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    /// Hex secp256k1 private key of the trading account
    #[arg(long)]
    key: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load pools, build routes and backrun the pending pool
    Start {
        /// Log opportunities without submitting bundles
        #[arg(long)]
        dry_run: bool,
    },
    /// Withdraw a token balance from the multihop contract
    Withdraw {
        #[arg(long)]
        token: Address,
    },
}

struct Keys {
    cosmos: CosmosKey,
    evm: PrivateKeySigner,
}

fn parse_key(key: &str) -> Result<Keys> {
    let secret: B256 = key.trim().parse().map_err(|e| eyre!("Invalid private key: {}", e))?;
    let cosmos = CosmosKey::from_slice(secret.as_slice())?;
    let evm = PrivateKeySigner::from_signing_key(cosmos.signing_key().clone());
    Ok(Keys { cosmos, evm })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = BotConfig::load(&cli.config).await?;
    let keys = parse_key(&cli.key)?;
    let client = Arc::new(RpcClient::new(&config.eth_rpc, config.http_timeout())?);
    let chain_id = client.chain_id().await?;

    match cli.command {
        Command::Start { dry_run } => start(config, keys, client, chain_id, dry_run).await,
        Command::Withdraw { token } => withdraw(config, keys, client, chain_id, token).await,
    }
}

async fn start(config: BotConfig, keys: Keys, client: Arc<RpcClient>, chain_id: u64, dry_run: bool) -> Result<()> {
    let multicall = MulticallManager::new(config.multicall_address, client.clone());
    let tokens = Arc::new(TokenCache::new(multicall.clone()));
    let loader = PoolLoader::new(multicall.clone(), tokens, config.pool_batch_size, config.max_concurrent_batches);

    let mut exchanges = Vec::with_capacity(config.exchanges.len());
    for exchange_config in &config.exchanges {
        let exchange = loader.connect_exchange(exchange_config).await?;
        loader.load_exchange(&exchange).await?;
        exchanges.push(exchange);
    }

    let capital = Arc::new(CapitalCeiling::new(config.base_token, config.capital_address));
    capital.refresh(&multicall).await?;
    info!("Capital ceiling {}", capital.get());

    let executor = if dry_run {
        info!("Dry run, bundles will not be submitted");
        None
    } else {
        let cosmos_address = keys.cosmos.bech32_address(&config.cosmos.bech32_prefix)?;
        let account = Arc::new(AccountWatcher::new(&config.cosmos_rest, cosmos_address, config.http_timeout())?);
        account.refresh().await?;
        account.spawn(config.account_refresh_interval(), config.refresh_retry_delay());

        let backrun_signer = EvmBackrunSigner::new(keys.evm, chain_id, config.capital_address, config.backrun_gas_limit);
        let payment_signer =
            CosmosPaymentSigner::new(keys.cosmos.clone(), &config.auction_house_address, config.cosmos.clone())?;
        let relay = Arc::new(SkipRelayClient::new(&config.relay_url, config.http_timeout())?);
        Some(Arc::new(TransactionExecutor::new(
            client.clone(),
            Arc::new(backrun_signer),
            Arc::new(payment_signer),
            Arc::new(keys.cosmos),
            account,
            relay,
            config.bid_ppm(),
        )))
    };

    let params = BackrunParams {
        base_token: config.base_token,
        min_profit: config.min_profit()?,
        min_hops: config.min_route_hops,
        max_hops: config.max_route_hops,
    };
    let backrunner = Arc::new(Backrunner::new(params, exchanges, capital.clone(), executor));

    let pools = backrunner.pools();
    let pool_count = pools.len();
    let mut token_addresses: Vec<Address> = pools.iter().flat_map(|pool| pool.get_tokens()).collect();
    token_addresses.sort_unstable();
    token_addresses.dedup();
    let price_feed = DefiLlamaPriceFeed::new(&config.price_api_url, &config.price_chain, config.http_timeout())?;
    let liquid = match price_feed.prices(&token_addresses).await {
        Ok(prices) => filter_liquid_pools(&pools, &prices, config.min_liquidity_usd),
        Err(e) => {
            warn!("Price lookup failed, keeping all {} pools: {}", pool_count, e);
            pools
        }
    };
    info!("{} liquid pools out of {}", liquid.len(), pool_count);

    if backrunner.update_routes(&liquid) == 0 {
        return Err(eyre!("No routes through {}", config.base_token));
    }
    // only pools on some route need fresh reserves
    let mut watched = HashSet::default();
    for route in backrunner.routes().routes() {
        for swap in &route.swaps {
            if watched.insert(swap.pool.get_address()) {
                spawn_reserve_watcher(
                    swap.pool.clone(),
                    multicall.clone(),
                    config.reserve_refresh_interval(),
                    config.refresh_retry_delay(),
                );
            }
        }
    }
    info!("Watching reserves of {} pools", watched.len());
    capital.spawn(multicall, config.capital_refresh_interval(), config.refresh_retry_delay());

    backrunner.run(PendingFilterFeed::new(client, config.poll_interval())).await;
    Ok(())
}

async fn withdraw(config: BotConfig, keys: Keys, client: Arc<RpcClient>, chain_id: u64, token: Address) -> Result<()> {
    let signer = EvmBackrunSigner::new(keys.evm, chain_id, config.capital_address, config.backrun_gas_limit);
    let nonce = client.transaction_count(signer.address()).await?;
    let gas_price = client.gas_price().await?;
    let raw = signer.sign_withdraw(token, gas_price, nonce, WITHDRAW_GAS_LIMIT)?;
    let hash = client.send_raw_transaction(&raw).await?;
    info!(%token, contract = %config.capital_address, "Withdraw sent: {}", hash);
    Ok(())
}
