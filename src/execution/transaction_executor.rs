use super::account::{AccountInfo, AccountWatcher};
use super::bundle::{Bundle, bid_for_profit};
use super::cosmos::PaymentRequest;
use super::evm::BackrunRequest;
use super::relay::{BundleRelay, SendBundleResult};
use super::signer::{BundleSigner, ExecutionError, TransactionSigner};
use crate::data_sync::rpc::ChainReader;
use crate::logic::quote::Quote;
use crate::logic::types::PendingTransaction;
use std::sync::Arc;
use tracing::{info, warn};

pub type BackrunSigner = Arc<dyn TransactionSigner<Request = BackrunRequest>>;
pub type PaymentSigner = Arc<dyn TransactionSigner<Request = PaymentRequest>>;

/// Turns a winning quote into a signed bundle and hands it to the relay
pub struct TransactionExecutor {
    reader: Arc<dyn ChainReader>,
    backrun_signer: BackrunSigner,
    payment_signer: PaymentSigner,
    bundle_signer: Arc<dyn BundleSigner>,
    account: Arc<AccountWatcher>,
    relay: Arc<dyn BundleRelay>,
    bid_ppm: u64,
}

impl TransactionExecutor {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        backrun_signer: BackrunSigner,
        payment_signer: PaymentSigner,
        bundle_signer: Arc<dyn BundleSigner>,
        account: Arc<AccountWatcher>,
        relay: Arc<dyn BundleRelay>,
        bid_ppm: u64,
    ) -> Self {
        Self { reader, backrun_signer, payment_signer, bundle_signer, account, relay, bid_ppm }
    }

    /// Sequence for the payment. When both signers share an account the backrun takes
    /// `nonce`, so the payment takes the next one; the watcher's snapshot may be stale.
    fn payment_sequence(&self, nonce: u64, account: AccountInfo) -> u64 {
        if self.payment_signer.sender() == self.backrun_signer.sender() {
            nonce.max(account.sequence) + 1
        } else {
            account.sequence
        }
    }

    /// Builds `[victim, backrun, payment]` and submits it
    pub async fn execute(&self, victim: &PendingTransaction, quote: &Quote) -> Result<SendBundleResult, ExecutionError> {
        let nonce = self
            .reader
            .transaction_count(self.backrun_signer.sender())
            .await
            .map_err(|e| ExecutionError::NonceUnavailable(e.to_string()))?;
        let request = BackrunRequest::from_quote(quote, victim.gas_pricing, nonce)?;
        let backrun = self.backrun_signer.sign_transaction(&request)?;

        let bid = bid_for_profit(quote.profit, self.bid_ppm);
        let account = self.account.current().ok_or(ExecutionError::AccountUnavailable)?;
        let payment = self.payment_signer.sign_transaction(&PaymentRequest {
            amount: bid,
            account_number: account.account_number,
            sequence: self.payment_sequence(nonce, account),
        })?;

        let bundle = Bundle::new(victim.raw.clone(), backrun, payment).sign(self.bundle_signer.as_ref())?;
        let result = self.relay.send_bundle(&bundle).await.map_err(|e| ExecutionError::Relay(e.to_string()))?;

        if result.is_accepted() {
            info!(victim = %victim.hash, profit = %quote.profit, %bid, height = %result.desired_height, "Bundle accepted");
        } else {
            warn!(victim = %victim.hash, code = result.code, "Bundle rejected: {}", result.error);
        }
        Ok(result)
    }
}
