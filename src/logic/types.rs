use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, B256, Bytes, U256};

/// Fee fields of an observed transaction, copied onto the backrun
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasPricing {
    Legacy { gas_price: u128 },
    DynamicFee { max_fee_per_gas: u128, max_priority_fee_per_gas: u128 },
}

/// An unconfirmed transaction as seen in the mempool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: U256,
    pub gas_pricing: GasPricing,
    /// EIP-2718 encoding, forwarded untouched as the first bundle entry
    pub raw: Bytes,
}

impl PendingTransaction {
    pub fn from_raw(raw: Bytes) -> eyre::Result<Self> {
        let mut buf: &[u8] = raw.as_ref();
        let envelope = TxEnvelope::decode_2718(&mut buf)?;

        let gas_pricing = if envelope.is_dynamic_fee() {
            GasPricing::DynamicFee {
                max_fee_per_gas: envelope.max_fee_per_gas(),
                max_priority_fee_per_gas: envelope.max_priority_fee_per_gas().unwrap_or_default(),
            }
        } else {
            GasPricing::Legacy { gas_price: envelope.gas_price().unwrap_or_default() }
        };

        Ok(Self {
            hash: *envelope.tx_hash(),
            to: envelope.to(),
            input: envelope.input().clone(),
            value: envelope.value(),
            gas_pricing,
            raw,
        })
    }
}
