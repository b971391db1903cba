use super::exchange::Exchange;
use super::pool::PoolWrapper;
use super::projector::{ProjectionError, project_calldata};
use super::quote::{Quote, find_best_quote};
use super::route_graph::RouteGraph;
use super::types::PendingTransaction;
use crate::data_sync::feed::TransactionFeed;
use crate::data_sync::refresh::CapitalCeiling;
use crate::execution::TransactionExecutor;
use ahash::HashMap;
use alloy_primitives::{Address, B256, U256};
use arc_swap::ArcSwap;
use dashmap::DashSet;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("projection of {tx} on {exchange} failed: {source}")]
    Projection { tx: B256, exchange: String, source: ProjectionError },
    #[error("analysis of {tx} aborted: {reason}")]
    Aborted { tx: B256, reason: String },
}

/// Base token, minimum profit and route length bounds
#[derive(Clone, Copy, Debug)]
pub struct BackrunParams {
    pub base_token: Address,
    pub min_profit: U256,
    pub min_hops: usize,
    pub max_hops: usize,
}

/// Watches pending router calls and backruns the profitable ones.
///
/// Every observed transaction gets its own task and nothing bounds how many run at once.
pub struct Backrunner {
    params: BackrunParams,
    exchanges: HashMap<Address, Arc<Exchange>>,
    routes: ArcSwap<RouteGraph>,
    capital: Arc<CapitalCeiling>,
    executor: Option<Arc<TransactionExecutor>>,
    seen: DashSet<B256>,
}

impl Backrunner {
    /// Without an executor, winning quotes are only logged
    pub fn new(
        params: BackrunParams,
        exchanges: Vec<Arc<Exchange>>,
        capital: Arc<CapitalCeiling>,
        executor: Option<Arc<TransactionExecutor>>,
    ) -> Self {
        let exchanges = exchanges.into_iter().map(|exchange| (exchange.get_router(), exchange)).collect();
        Self { params, exchanges, routes: ArcSwap::from_pointee(RouteGraph::new()), capital, executor, seen: DashSet::new() }
    }

    pub fn exchange(&self, router: &Address) -> Option<&Arc<Exchange>> {
        self.exchanges.get(router)
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Arc<Exchange>> {
        self.exchanges.values()
    }

    /// Every pool known to any exchange
    pub fn pools(&self) -> Vec<PoolWrapper> {
        self.exchanges.values().flat_map(|exchange| exchange.pools().snapshot()).collect()
    }

    pub fn routes(&self) -> Arc<RouteGraph> {
        self.routes.load_full()
    }

    /// Rebuilds the route graph from `pools` and publishes it. Returns the route count.
    pub fn update_routes(&self, pools: &[PoolWrapper]) -> usize {
        let graph = RouteGraph::build(self.params.base_token, self.params.min_hops, self.params.max_hops, pools);
        let count = graph.len();
        info!("Found {} routes over {} pools", count, graph.pool_count());
        self.routes.store(Arc::new(graph));
        count
    }

    /// Best quote enabled by `tx`, if it reaches the minimum profit
    pub fn analyze(&self, tx: &PendingTransaction) -> Result<Option<Quote>, AnalysisError> {
        let Some(exchange) = tx.to.and_then(|to| self.exchanges.get(&to)) else {
            return Ok(None);
        };
        let overlay = project_calldata(&tx.input, tx.value, exchange)
            .map_err(|source| AnalysisError::Projection { tx: tx.hash, exchange: exchange.get_name().to_string(), source })?;
        let Some(overlay) = overlay else {
            trace!(tx = %tx.hash, "Call does not move reserves");
            return Ok(None);
        };

        let routes = self.routes.load().routes_for_overlay(&overlay);
        let quote = find_best_quote(&routes, Some(&overlay), self.capital.get());
        Ok(quote.filter(|quote| quote.profit >= self.params.min_profit))
    }

    /// Spawns the analysis of an unseen router transaction
    pub fn on_transaction(self: &Arc<Self>, tx: PendingTransaction) -> Option<JoinHandle<()>> {
        if !self.seen.insert(tx.hash) {
            return None;
        }
        if !tx.to.is_some_and(|to| self.exchanges.contains_key(&to)) {
            return None;
        }
        let backrunner = self.clone();
        Some(tokio::spawn(async move { backrunner.handle(tx).await }))
    }

    /// Runs [`Backrunner::analyze`] on the blocking pool so the rayon quote search
    /// never occupies an async worker
    pub async fn analyze_blocking(self: &Arc<Self>, tx: PendingTransaction) -> Result<Option<Quote>, AnalysisError> {
        let backrunner = self.clone();
        let hash = tx.hash;
        tokio::task::spawn_blocking(move || backrunner.analyze(&tx))
            .await
            .map_err(|e| AnalysisError::Aborted { tx: hash, reason: e.to_string() })?
    }

    async fn handle(self: Arc<Self>, tx: PendingTransaction) {
        let start = Instant::now();
        let quote = match self.analyze_blocking(tx.clone()).await {
            Ok(Some(quote)) => quote,
            Ok(None) => {
                trace!(tx = %tx.hash, elapsed = ?start.elapsed(), "No opportunity");
                return;
            }
            Err(e) => {
                debug!("{}", e);
                return;
            }
        };

        info!(
            tx = %tx.hash,
            route = %quote.route,
            amount_in = %quote.amount_in,
            amount_out = %quote.amount_out,
            profit = %quote.profit,
            elapsed = ?start.elapsed(),
            "Arbitrage opportunity found"
        );

        if let Some(executor) = &self.executor {
            if let Err(e) = executor.execute(&tx, &quote).await {
                warn!(tx = %tx.hash, "Bundle submission failed: {}", e);
            }
        }
    }

    /// Feeds every transaction of `feed` to [`Backrunner::on_transaction`] until the feed ends
    pub async fn run<F: TransactionFeed>(self: &Arc<Self>, mut feed: F) {
        while let Some(tx) = feed.next().await {
            self.on_transaction(tx);
        }
        info!("Transaction feed closed");
    }
}
