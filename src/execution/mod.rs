/// Execution Layer
///
/// This layer is responsible for:
/// - Signing the backrun against the multihop contract
/// - Signing the Cosmos payment that carries the bid
/// - Assembling, signing and relaying the bundle
/// - Tracking the payment account's sequence
pub mod account;
pub mod bundle;
pub mod cosmos;
pub mod evm;
pub mod relay;
pub mod signer;
pub mod transaction_executor;

pub use account::{AccountInfo, AccountWatcher};
pub use bundle::{Bundle, SignedBundle, bid_for_profit};
pub use cosmos::{CosmosKey, CosmosPaymentSigner, PaymentRequest};
pub use evm::{BackrunRequest, EvmBackrunSigner, IMultihop};
pub use relay::{BundleRelay, SendBundleResult, SkipRelayClient};
pub use signer::{BundleSigner, ExecutionError, TransactionSigner};
pub use transaction_executor::{BackrunSigner, PaymentSigner, TransactionExecutor};
