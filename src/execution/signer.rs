use alloy_primitives::{Address, Bytes};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("encoding failed: {0}")]
    Encoding(String),
    #[error("cosmos account not loaded yet")]
    AccountUnavailable,
    #[error("nonce unavailable: {0}")]
    NonceUnavailable(String),
    #[error("relay error: {0}")]
    Relay(String),
}

/// Turns a request into a signed, serialized transaction
pub trait TransactionSigner: Send + Sync {
    type Request;

    /// Account whose nonce or sequence the signed transactions consume
    fn sender(&self) -> Address;

    fn sign_transaction(&self, request: &Self::Request) -> Result<Bytes, ExecutionError>;
}

/// Signs the concatenation of a bundle's transactions
pub trait BundleSigner: Send + Sync {
    /// Compressed secp256k1 public key sent along with the signature
    fn public_key(&self) -> Vec<u8>;

    fn sign_bundle(&self, payload: &[u8]) -> Result<Vec<u8>, ExecutionError>;
}
