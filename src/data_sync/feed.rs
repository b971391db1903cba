use super::rpc::RpcClient;
use crate::logic::types::PendingTransaction;
use alloy_primitives::{B256, Bytes};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Source of pending transactions. `None` ends the stream.
#[async_trait]
pub trait TransactionFeed: Send {
    async fn next(&mut self) -> Option<PendingTransaction>;
}

/// Transactions pushed through a channel
pub struct ChannelFeed {
    receiver: mpsc::Receiver<PendingTransaction>,
}

impl ChannelFeed {
    pub fn new(receiver: mpsc::Receiver<PendingTransaction>) -> Self {
        Self { receiver }
    }

    pub fn channel(buffer: usize) -> (mpsc::Sender<PendingTransaction>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl TransactionFeed for ChannelFeed {
    async fn next(&mut self) -> Option<PendingTransaction> {
        self.receiver.recv().await
    }
}

/// Fetches and decodes the raw bytes of every hash concurrently, keeping hash order.
/// Hashes that are gone, fail to fetch or fail to decode are dropped.
pub async fn fetch_pending<F, Fut>(hashes: Vec<B256>, fetch: F) -> Vec<PendingTransaction>
where
    F: Fn(B256) -> Fut,
    Fut: Future<Output = eyre::Result<Option<Bytes>>>,
{
    let results = join_all(hashes.iter().map(|hash| fetch(*hash))).await;
    let mut transactions = Vec::with_capacity(hashes.len());
    for (hash, result) in hashes.into_iter().zip(results) {
        match result {
            Ok(Some(raw)) => match PendingTransaction::from_raw(raw) {
                Ok(tx) => transactions.push(tx),
                Err(e) => debug!(%hash, "Cannot decode pending transaction: {}", e),
            },
            Ok(None) => debug!(%hash, "Pending transaction already gone"),
            Err(e) => debug!(%hash, "Cannot fetch pending transaction: {}", e),
        }
    }
    transactions
}

/// Polls a pending transaction filter and fetches the raw bytes of every new hash
pub struct PendingFilterFeed {
    client: Arc<RpcClient>,
    poll_interval: Duration,
    filter_id: Option<String>,
    ready: VecDeque<PendingTransaction>,
}

impl PendingFilterFeed {
    pub fn new(client: Arc<RpcClient>, poll_interval: Duration) -> Self {
        Self { client, poll_interval, filter_id: None, ready: VecDeque::new() }
    }

    async fn poll(&mut self) -> eyre::Result<()> {
        let filter_id = match &self.filter_id {
            Some(filter_id) => filter_id.clone(),
            None => {
                let filter_id = self.client.new_pending_transaction_filter().await?;
                debug!("Installed pending transaction filter {}", filter_id);
                self.filter_id = Some(filter_id.clone());
                filter_id
            }
        };
        let hashes = match self.client.get_filter_changes(&filter_id).await {
            Ok(hashes) => hashes,
            Err(e) => {
                // filters expire on the node; install a new one next time
                self.filter_id = None;
                return Err(e);
            }
        };
        let client = self.client.clone();
        let transactions = fetch_pending(hashes, |hash| {
            let client = client.clone();
            async move { client.get_raw_transaction_by_hash(hash).await }
        })
        .await;
        self.ready.extend(transactions);
        Ok(())
    }
}

#[async_trait]
impl TransactionFeed for PendingFilterFeed {
    async fn next(&mut self) -> Option<PendingTransaction> {
        loop {
            if let Some(tx) = self.ready.pop_front() {
                return Some(tx);
            }
            if let Err(e) = self.poll().await {
                warn!("Pending transaction poll failed: {}", e);
            }
            if self.ready.is_empty() {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}
