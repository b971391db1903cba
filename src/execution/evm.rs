use super::signer::{ExecutionError, TransactionSigner};
use crate::logic::quote::Quote;
use crate::logic::types::GasPricing;
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolCall, sol};

sol! {
    #[sol(all_derives)]
    interface IMultihop {
        struct DexHop {
            address pairAddress;
            bool zeroToOne;
            uint256 fee;
        }

        function swapMultihop(address fromToken, uint256 fromAmount, DexHop[] route) external;
        function withdraw(address token) external returns (bool);
        function withdrawNativeBalance() external;
    }
}

/// Everything needed to sign one backrun
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackrunRequest {
    pub token_in: Address,
    pub amount_in: U256,
    pub hops: Vec<IMultihop::DexHop>,
    /// Copied from the observed transaction
    pub gas_pricing: GasPricing,
    pub nonce: u64,
}

impl BackrunRequest {
    /// Each hop carries the pool's fee numerator
    pub fn from_quote(quote: &Quote, gas_pricing: GasPricing, nonce: u64) -> Result<Self, ExecutionError> {
        let token_in = quote
            .route
            .token_in()
            .map(|token| token.get_address())
            .ok_or_else(|| ExecutionError::Encoding("empty route".to_string()))?;
        let hops = quote
            .route
            .swaps
            .iter()
            .map(|swap| IMultihop::DexHop {
                pairAddress: swap.pool.get_address(),
                zeroToOne: swap.zero_for_one,
                fee: swap.pool.get_fee().fee,
            })
            .collect();
        Ok(Self { token_in, amount_in: quote.amount_in, hops, gas_pricing, nonce })
    }

    pub fn calldata(&self) -> Bytes {
        IMultihop::swapMultihopCall { fromToken: self.token_in, fromAmount: self.amount_in, route: self.hops.clone() }
            .abi_encode()
            .into()
    }
}

/// Signs calls to the multihop contract with the bot's key
#[derive(Clone, Debug)]
pub struct EvmBackrunSigner {
    signer: PrivateKeySigner,
    chain_id: u64,
    contract: Address,
    gas_limit: u64,
}

impl EvmBackrunSigner {
    pub fn new(signer: PrivateKeySigner, chain_id: u64, contract: Address, gas_limit: u64) -> Self {
        Self { signer, chain_id, contract, gas_limit }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Type 2 for dynamic fee pricing, EIP-155 legacy otherwise
    pub fn sign_call(&self, input: Bytes, gas_pricing: GasPricing, nonce: u64, gas_limit: u64) -> Result<Bytes, ExecutionError> {
        let envelope: TxEnvelope = match gas_pricing {
            GasPricing::DynamicFee { max_fee_per_gas, max_priority_fee_per_gas } => {
                let tx = TxEip1559 {
                    chain_id: self.chain_id,
                    nonce,
                    gas_limit,
                    max_fee_per_gas,
                    max_priority_fee_per_gas,
                    to: TxKind::Call(self.contract),
                    value: U256::ZERO,
                    access_list: Default::default(),
                    input,
                };
                let signature =
                    self.signer.sign_hash_sync(&tx.signature_hash()).map_err(|e| ExecutionError::Signing(e.to_string()))?;
                tx.into_signed(signature).into()
            }
            GasPricing::Legacy { gas_price } => {
                let tx = TxLegacy {
                    chain_id: Some(self.chain_id),
                    nonce,
                    gas_price,
                    gas_limit,
                    to: TxKind::Call(self.contract),
                    value: U256::ZERO,
                    input,
                };
                let signature =
                    self.signer.sign_hash_sync(&tx.signature_hash()).map_err(|e| ExecutionError::Signing(e.to_string()))?;
                tx.into_signed(signature).into()
            }
        };
        Ok(envelope.encoded_2718().into())
    }

    /// `withdraw(token)` sending the contract's balance back to the owner
    pub fn sign_withdraw(&self, token: Address, gas_price: u128, nonce: u64, gas_limit: u64) -> Result<Bytes, ExecutionError> {
        let input = IMultihop::withdrawCall { token }.abi_encode().into();
        self.sign_call(input, GasPricing::Legacy { gas_price }, nonce, gas_limit)
    }
}

impl TransactionSigner for EvmBackrunSigner {
    type Request = BackrunRequest;

    fn sender(&self) -> Address {
        self.address()
    }

    fn sign_transaction(&self, request: &BackrunRequest) -> Result<Bytes, ExecutionError> {
        self.sign_call(request.calldata(), request.gas_pricing, request.nonce, self.gas_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::amm::FeeModel;
    use crate::logic::pool::{Pool, PoolWrapper, Reserves};
    use crate::logic::route::{Route, Swap};
    use crate::logic::types::PendingTransaction;
    use crate::utils::Token;
    use alloy_consensus::Transaction;
    use alloy_eips::eip2718::Decodable2718;
    use std::sync::Arc;

    const CONTRACT: Address = Address::repeat_byte(0xcc);

    fn pool(address: u8, fee: FeeModel) -> PoolWrapper {
        Arc::new(Pool::new(
            Address::repeat_byte(address),
            "test",
            fee,
            Arc::new(Token::repeat_byte(0x01)),
            Arc::new(Token::repeat_byte(0x02)),
            Reserves::new(U256::from(100_000), U256::from(100_000)),
        ))
    }

    fn quote() -> Quote {
        let cheap = FeeModel::new(U256::from(2), U256::from(1000)).unwrap();
        let route = Route::new(vec![Swap::new(pool(0x10, FeeModel::UNISWAP_V2), true), Swap::new(pool(0x11, cheap), false)]);
        Quote { amount_in: U256::from(4628), amount_out: U256::from(5053), profit: U256::from(425), route: Arc::new(route) }
    }

    #[test]
    fn test_request_from_quote() -> eyre::Result<()> {
        let request = BackrunRequest::from_quote(&quote(), GasPricing::Legacy { gas_price: 7 }, 3)?;
        assert_eq!(request.token_in, Address::repeat_byte(0x01));
        assert_eq!(request.amount_in, U256::from(4628));
        assert_eq!(
            request.hops,
            vec![
                IMultihop::DexHop { pairAddress: Address::repeat_byte(0x10), zeroToOne: true, fee: U256::from(3) },
                IMultihop::DexHop { pairAddress: Address::repeat_byte(0x11), zeroToOne: false, fee: U256::from(2) },
            ]
        );

        let decoded = IMultihop::swapMultihopCall::abi_decode(&request.calldata())?;
        assert_eq!(decoded.fromAmount, U256::from(4628));
        assert_eq!(decoded.route.len(), 2);
        Ok(())
    }

    #[test]
    fn test_sign_dynamic_fee_backrun() -> eyre::Result<()> {
        let signer = EvmBackrunSigner::new(PrivateKeySigner::random(), 9001, CONTRACT, 400_000);
        let pricing = GasPricing::DynamicFee { max_fee_per_gas: 40, max_priority_fee_per_gas: 2 };
        let request = BackrunRequest::from_quote(&quote(), pricing, 11)?;
        let raw = signer.sign_transaction(&request)?;

        let mut buf: &[u8] = raw.as_ref();
        let envelope = TxEnvelope::decode_2718(&mut buf)?;
        assert!(envelope.is_eip1559());
        assert_eq!(envelope.nonce(), 11);
        assert_eq!(envelope.gas_limit(), 400_000);
        assert_eq!(envelope.chain_id(), Some(9001));
        assert_eq!(envelope.to(), Some(CONTRACT));

        let pending = PendingTransaction::from_raw(raw)?;
        assert_eq!(pending.gas_pricing, pricing);
        assert_eq!(pending.input, request.calldata());
        Ok(())
    }

    #[test]
    fn test_sign_legacy_withdraw() -> eyre::Result<()> {
        let signer = EvmBackrunSigner::new(PrivateKeySigner::random(), 9001, CONTRACT, 400_000);
        let raw = signer.sign_withdraw(Address::repeat_byte(0x01), 25, 0, 900_000)?;

        let mut buf: &[u8] = raw.as_ref();
        let envelope = TxEnvelope::decode_2718(&mut buf)?;
        assert!(envelope.is_legacy());
        assert_eq!(envelope.gas_price(), Some(25));
        assert_eq!(envelope.gas_limit(), 900_000);
        assert_eq!(envelope.chain_id(), Some(9001));
        assert_eq!(&envelope.input()[..4], &IMultihop::withdrawCall::SELECTOR);
        Ok(())
    }
}
