use super::signer::{BundleSigner, ExecutionError};
use alloy_primitives::{Bytes, U256};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const PPM: u64 = 1_000_000;

/// `profit * bid_ppm / 1_000_000`, rounded down, never above the profit
pub fn bid_for_profit(profit: U256, bid_ppm: u64) -> U256 {
    let ppm = U256::from(bid_ppm.min(PPM));
    let scale = U256::from(PPM);
    (profit / scale) * ppm + (profit % scale) * ppm / scale
}

/// Victim, backrun and payment, in the order the relay must include them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub victim: Bytes,
    pub backrun: Bytes,
    pub payment: Bytes,
}

impl Bundle {
    pub fn new(victim: Bytes, backrun: Bytes, payment: Bytes) -> Self {
        Self { victim, backrun, payment }
    }

    pub fn transactions(&self) -> [&Bytes; 3] {
        [&self.victim, &self.backrun, &self.payment]
    }

    /// The byte string the bundle signature covers
    pub fn concatenated(&self) -> Vec<u8> {
        self.transactions().iter().flat_map(|tx| tx.iter().copied()).collect()
    }

    pub fn sign(&self, signer: &dyn BundleSigner) -> Result<SignedBundle, ExecutionError> {
        let signature = signer.sign_bundle(&self.concatenated())?;
        Ok(SignedBundle {
            transactions: self.transactions().iter().map(|tx| STANDARD.encode(tx)).collect(),
            desired_height: 0,
            public_key: STANDARD.encode(signer.public_key()),
            signature: STANDARD.encode(signature),
        })
    }
}

/// A bundle in relay wire form, every field base64
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBundle {
    pub transactions: Vec<String>,
    /// 0 lets the relay pick the next height
    pub desired_height: u64,
    pub public_key: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner;

    impl BundleSigner for FixedSigner {
        fn public_key(&self) -> Vec<u8> {
            vec![0x02; 33]
        }

        fn sign_bundle(&self, payload: &[u8]) -> Result<Vec<u8>, ExecutionError> {
            Ok(payload.iter().rev().copied().collect())
        }
    }

    #[test]
    fn test_bid_for_profit() {
        assert_eq!(bid_for_profit(U256::from(425), 500_000), U256::from(212));
        assert_eq!(bid_for_profit(U256::from(425), 1_000_000), U256::from(425));
        assert_eq!(bid_for_profit(U256::from(425), 2_000_000), U256::from(425));
        assert_eq!(bid_for_profit(U256::from(425), 0), U256::ZERO);
        assert_eq!(bid_for_profit(U256::MAX, 1_000_000), U256::MAX);
        assert!(bid_for_profit(U256::MAX, 999_999) < U256::MAX);
    }

    #[test]
    fn test_sign_bundle_order() -> Result<(), ExecutionError> {
        let bundle = Bundle::new(Bytes::from_static(&[1, 2]), Bytes::from_static(&[3]), Bytes::from_static(&[4, 5]));
        assert_eq!(bundle.concatenated(), vec![1, 2, 3, 4, 5]);

        let signed = bundle.sign(&FixedSigner)?;
        assert_eq!(signed.transactions, vec!["AQI=".to_string(), "Aw==".to_string(), "BAU=".to_string()]);
        assert_eq!(signed.signature, STANDARD.encode([5, 4, 3, 2, 1]));
        assert_eq!(signed.public_key, STANDARD.encode([0x02; 33]));
        assert_eq!(signed.desired_height, 0);
        Ok(())
    }
}
