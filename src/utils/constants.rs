use alloy_primitives::{Address, address};

pub const WEVMOS: Address = address!("0xD4949664cD82660AaE99bEdc034a0deA8A0bd517");

pub const NATIVE: Address = Address::ZERO;

/// Multicall3 is deployed at the same address on most EVM chains
pub const MULTICALL3: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

/// Ethermint account and payment defaults
pub const COSMOS_CHAIN_ID: &str = "evmos_9001-2";
pub const BECH32_PREFIX: &str = "evmos";
pub const NATIVE_DENOM: &str = "aevmos";
pub const PAYMENT_GAS_LIMIT: u64 = 5_000_000;
pub const PAYMENT_FEE_AMOUNT: &str = "200000000000000000";

pub const BACKRUN_GAS_LIMIT: u64 = 400_000;
pub const WITHDRAW_GAS_LIMIT: u64 = 900_000;

/// Uniswap V2 default fee, 0.3%
pub const DEFAULT_FEE: u64 = 3;
pub const DEFAULT_FEE_BASE: u64 = 1000;
