use super::rpc::ChainReader;
use crate::logic::pool::Reserves;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use eyre::Result;
use std::sync::Arc;
use tracing::warn;

sol! {
    /// Multicall3 contract interface
    #[sol(all_derives)]
    contract Multicall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) public payable returns (Result[] memory returnData);
    }

    interface IUniswapV2Pair {
        function factory() external view returns (address);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
    }

    interface IUniswapV2Factory {
        function allPairs(uint256 index) external view returns (address);
        function allPairsLength() external view returns (uint256);
        function totalPairs() external view returns (uint256);
    }

    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Batches view calls through a Multicall3 deployment
#[derive(Clone)]
pub struct MulticallManager {
    multicall_address: Address,
    reader: Arc<dyn ChainReader>,
}

impl MulticallManager {
    pub fn new(multicall_address: Address, reader: Arc<dyn ChainReader>) -> Self {
        Self { multicall_address, reader }
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    /// A call that may fail without failing the batch
    pub fn prepare_call<C: SolCall>(target: Address, call: &C) -> Multicall3::Call3 {
        Multicall3::Call3 { target, allowFailure: true, callData: call.abi_encode().into() }
    }

    /// Decodes one batch entry; failed or malformed entries give `None`
    pub fn decode_result<C: SolCall>(result: &Multicall3::Result) -> Option<C::Return> {
        if !result.success {
            return None;
        }
        C::abi_decode_returns(&result.returnData).ok()
    }

    pub async fn aggregate3(&self, calls: Vec<Multicall3::Call3>) -> Result<Vec<Multicall3::Result>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let expected = calls.len();
        let data = Multicall3::aggregate3Call { calls }.abi_encode();
        let response = self.reader.call(self.multicall_address, data.into()).await?;
        let results = Multicall3::aggregate3Call::abi_decode_returns(&response)?;
        if results.len() != expected {
            return Err(eyre::eyre!("aggregate3 returned {} results for {} calls", results.len(), expected));
        }
        Ok(results)
    }

    /// Current reserves of each pair, `None` where the pair could not be read
    pub async fn batch_get_reserves(&self, pool_addresses: &[Address]) -> Result<Vec<(Address, Option<Reserves>)>> {
        let calls =
            pool_addresses.iter().map(|pool| Self::prepare_call(*pool, &IUniswapV2Pair::getReservesCall {})).collect();
        let results = self.aggregate3(calls).await?;

        Ok(pool_addresses
            .iter()
            .zip(results.iter())
            .map(|(pool, result)| {
                let reserves = Self::decode_result::<IUniswapV2Pair::getReservesCall>(result)
                    .map(|r| Reserves::new(U256::from(r.reserve0), U256::from(r.reserve1)));
                if reserves.is_none() {
                    warn!("Failed to read reserves for pool {}", pool);
                }
                (*pool, reserves)
            })
            .collect())
    }

    /// Reserves of a single pair, read directly
    pub async fn get_reserves(&self, pool: Address) -> Result<Reserves> {
        let response = self.reader.call(pool, IUniswapV2Pair::getReservesCall {}.abi_encode().into()).await?;
        let reserves = IUniswapV2Pair::getReservesCall::abi_decode_returns(&response)?;
        Ok(Reserves::new(U256::from(reserves.reserve0), U256::from(reserves.reserve1)))
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let response = self.reader.call(token, IERC20::balanceOfCall { owner }.abi_encode().into()).await?;
        Ok(IERC20::balanceOfCall::abi_decode_returns(&response)?)
    }
}
