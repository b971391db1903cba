use alloy_sol_types::{SolCall, sol};
use strum_macros::{Display, EnumIter};

sol! {
    /// Uniswap V2 router methods that move pool reserves
    #[sol(all_derives)]
    interface IUniswapV2Router02 {
        function WETH() external view returns (address);

        function addLiquidity(address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);

        function swapTokensForExactTokens(uint256 amountOut, uint256 amountInMax, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapTokensForExactETH(uint256 amountOut, uint256 amountInMax, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
        function swapETHForExactTokens(uint256 amountOut, address[] calldata path, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
    }
}

use IUniswapV2Router02::{
    addLiquidityCall, swapETHForExactTokensCall, swapExactETHForTokensCall, swapExactTokensForETHCall,
    swapExactTokensForTokensCall, swapTokensForExactETHCall, swapTokensForExactTokensCall,
};

/// Router operation kind, identified by the 4-byte selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RouterMethod {
    #[strum(serialize = "addLiquidity")]
    AddLiquidity,
    #[strum(serialize = "swapExactTokensForTokens")]
    SwapExactTokensForTokens,
    #[strum(serialize = "swapExactETHForTokens")]
    SwapExactEthForTokens,
    #[strum(serialize = "swapExactTokensForETH")]
    SwapExactTokensForEth,
    #[strum(serialize = "swapTokensForExactTokens")]
    SwapTokensForExactTokens,
    #[strum(serialize = "swapTokensForExactETH")]
    SwapTokensForExactEth,
    #[strum(serialize = "swapETHForExactTokens")]
    SwapEthForExactTokens,
    #[strum(serialize = "unknown")]
    Unknown,
}

impl RouterMethod {
    pub fn from_selector(selector: [u8; 4]) -> Self {
        match selector {
            addLiquidityCall::SELECTOR => RouterMethod::AddLiquidity,
            swapExactTokensForTokensCall::SELECTOR => RouterMethod::SwapExactTokensForTokens,
            swapExactETHForTokensCall::SELECTOR => RouterMethod::SwapExactEthForTokens,
            swapExactTokensForETHCall::SELECTOR => RouterMethod::SwapExactTokensForEth,
            swapTokensForExactTokensCall::SELECTOR => RouterMethod::SwapTokensForExactTokens,
            swapTokensForExactETHCall::SELECTOR => RouterMethod::SwapTokensForExactEth,
            swapETHForExactTokensCall::SELECTOR => RouterMethod::SwapEthForExactTokens,
            _ => RouterMethod::Unknown,
        }
    }

    /// Input-amount-fixed swaps
    pub fn is_exact_in(&self) -> bool {
        matches!(
            self,
            RouterMethod::SwapExactTokensForTokens | RouterMethod::SwapExactEthForTokens | RouterMethod::SwapExactTokensForEth
        )
    }

    /// Output-amount-fixed swaps
    pub fn is_exact_out(&self) -> bool {
        matches!(
            self,
            RouterMethod::SwapTokensForExactTokens | RouterMethod::SwapTokensForExactEth | RouterMethod::SwapEthForExactTokens
        )
    }
}

/// Decoded router call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    AddLiquidity(addLiquidityCall),
    SwapExactTokensForTokens(swapExactTokensForTokensCall),
    SwapExactEthForTokens(swapExactETHForTokensCall),
    SwapExactTokensForEth(swapExactTokensForETHCall),
    SwapTokensForExactTokens(swapTokensForExactTokensCall),
    SwapTokensForExactEth(swapTokensForExactETHCall),
    SwapEthForExactTokens(swapETHForExactTokensCall),
    Unknown,
}

impl RouterCall {
    /// Calldata shorter than a selector, or with an unrecognized selector, decodes to [`RouterCall::Unknown`].
    pub fn decode(input: &[u8]) -> Result<Self, alloy_sol_types::Error> {
        let Some(selector) = input.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) else {
            return Ok(RouterCall::Unknown);
        };
        let call = match RouterMethod::from_selector(selector) {
            RouterMethod::AddLiquidity => RouterCall::AddLiquidity(addLiquidityCall::abi_decode(input)?),
            RouterMethod::SwapExactTokensForTokens => {
                RouterCall::SwapExactTokensForTokens(swapExactTokensForTokensCall::abi_decode(input)?)
            }
            RouterMethod::SwapExactEthForTokens => RouterCall::SwapExactEthForTokens(swapExactETHForTokensCall::abi_decode(input)?),
            RouterMethod::SwapExactTokensForEth => RouterCall::SwapExactTokensForEth(swapExactTokensForETHCall::abi_decode(input)?),
            RouterMethod::SwapTokensForExactTokens => {
                RouterCall::SwapTokensForExactTokens(swapTokensForExactTokensCall::abi_decode(input)?)
            }
            RouterMethod::SwapTokensForExactEth => RouterCall::SwapTokensForExactEth(swapTokensForExactETHCall::abi_decode(input)?),
            RouterMethod::SwapEthForExactTokens => RouterCall::SwapEthForExactTokens(swapETHForExactTokensCall::abi_decode(input)?),
            RouterMethod::Unknown => RouterCall::Unknown,
        };
        Ok(call)
    }

    pub fn method(&self) -> RouterMethod {
        match self {
            RouterCall::AddLiquidity(_) => RouterMethod::AddLiquidity,
            RouterCall::SwapExactTokensForTokens(_) => RouterMethod::SwapExactTokensForTokens,
            RouterCall::SwapExactEthForTokens(_) => RouterMethod::SwapExactEthForTokens,
            RouterCall::SwapExactTokensForEth(_) => RouterMethod::SwapExactTokensForEth,
            RouterCall::SwapTokensForExactTokens(_) => RouterMethod::SwapTokensForExactTokens,
            RouterCall::SwapTokensForExactEth(_) => RouterMethod::SwapTokensForExactEth,
            RouterCall::SwapEthForExactTokens(_) => RouterMethod::SwapEthForExactTokens,
            RouterCall::Unknown => RouterMethod::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256, hex};
    use strum::IntoEnumIterator;

    #[test]
    fn test_selectors() {
        assert_eq!(RouterMethod::from_selector(hex!("e8e33700")), RouterMethod::AddLiquidity);
        assert_eq!(RouterMethod::from_selector(hex!("38ed1739")), RouterMethod::SwapExactTokensForTokens);
        assert_eq!(RouterMethod::from_selector(hex!("8803dbee")), RouterMethod::SwapTokensForExactTokens);
        assert_eq!(RouterMethod::from_selector(hex!("7ff36ab5")), RouterMethod::SwapExactEthForTokens);
        assert_eq!(RouterMethod::from_selector(hex!("4a25d94a")), RouterMethod::SwapTokensForExactEth);
        assert_eq!(RouterMethod::from_selector(hex!("18cbafe5")), RouterMethod::SwapExactTokensForEth);
        assert_eq!(RouterMethod::from_selector(hex!("fb3bdb41")), RouterMethod::SwapEthForExactTokens);
        assert_eq!(RouterMethod::from_selector(hex!("a9059cbb")), RouterMethod::Unknown);
    }

    #[test]
    fn test_method_kinds() {
        assert_eq!(RouterMethod::iter().filter(RouterMethod::is_exact_in).count(), 3);
        assert_eq!(RouterMethod::iter().filter(RouterMethod::is_exact_out).count(), 3);
        assert_eq!(RouterMethod::SwapExactEthForTokens.to_string(), "swapExactETHForTokens");
    }

    #[test]
    fn test_decode_swap() {
        let call = swapExactTokensForTokensCall {
            amountIn: U256::from(1000),
            amountOutMin: U256::from(900),
            path: vec![Address::repeat_byte(0x0a), Address::repeat_byte(0x0b)],
            to: Address::repeat_byte(0x01),
            deadline: U256::from(1),
        };
        let decoded = RouterCall::decode(&call.abi_encode()).unwrap();
        assert_eq!(decoded.method(), RouterMethod::SwapExactTokensForTokens);
        assert_eq!(decoded, RouterCall::SwapExactTokensForTokens(call));
    }

    #[test]
    fn test_decode_unknown_and_short_input() {
        assert_eq!(RouterCall::decode(&[]).unwrap(), RouterCall::Unknown);
        assert_eq!(RouterCall::decode(&[0xe8, 0xe3, 0x37]).unwrap(), RouterCall::Unknown);
        assert_eq!(RouterCall::decode(&hex!("a9059cbb00")).unwrap(), RouterCall::Unknown);
    }

    #[test]
    fn test_decode_truncated_payload_fails() {
        let mut input = hex!("38ed1739").to_vec();
        input.extend_from_slice(&[0u8; 40]);
        assert!(RouterCall::decode(&input).is_err());
    }
}
