use super::multicall::Multicall3;
use super::rpc::ChainReader;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use dashmap::DashMap;
use eyre::{Result, eyre};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory chain answering `eth_call` from a `(target, calldata)` table.
/// Calls to the multicall address are unpacked and answered entry by entry.
#[derive(Debug)]
pub struct MockChainReader {
    multicall_address: Address,
    calls: DashMap<(Address, Bytes), Bytes>,
    nonces: DashMap<Address, u64>,
    chain_id: u64,
    call_count: AtomicUsize,
}

impl MockChainReader {
    pub fn new(multicall_address: Address) -> Self {
        Self {
            multicall_address,
            calls: DashMap::new(),
            nonces: DashMap::new(),
            chain_id: 9001,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn set_raw(&self, target: Address, data: Bytes, ret: Bytes) {
        self.calls.insert((target, data), ret);
    }

    pub fn set_call_return<C: SolCall>(&self, target: Address, call: &C, ret: &C::Return) {
        self.set_raw(target, call.abi_encode().into(), C::abi_encode_returns(ret).into());
    }

    pub fn remove_call<C: SolCall>(&self, target: Address, call: &C) {
        self.calls.remove(&(target, Bytes::from(call.abi_encode())));
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.nonces.insert(address, nonce);
    }

    /// Number of `call` requests served, a multicall batch counting once
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    fn lookup(&self, target: Address, data: &Bytes) -> Option<Bytes> {
        self.calls.get(&(target, data.clone())).map(|entry| entry.value().clone())
    }

    fn aggregate3(&self, call: Multicall3::aggregate3Call) -> Result<Bytes> {
        let mut results = Vec::with_capacity(call.calls.len());
        for entry in call.calls {
            match self.lookup(entry.target, &entry.callData) {
                Some(data) => results.push(Multicall3::Result { success: true, returnData: data }),
                None if entry.allowFailure => results.push(Multicall3::Result { success: false, returnData: Bytes::new() }),
                None => return Err(eyre!("Multicall3: call failed")),
            }
        }
        Ok(Multicall3::aggregate3Call::abi_encode_returns(&results).into())
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if to == self.multicall_address {
            if let Ok(call) = Multicall3::aggregate3Call::abi_decode(&data) {
                return self.aggregate3(call);
            }
        }
        self.lookup(to, &data).ok_or_else(|| eyre!("execution reverted"))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.nonces.get(&address).map(|nonce| *nonce).unwrap_or_default())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }
}
