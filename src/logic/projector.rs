use super::amm::{AmmError, checked_add, checked_sub, quote};
use super::exchange::Exchange;
use super::overlay::ReserveOverlay;
use super::pool::{PoolWrapper, Reserves};
use super::router::RouterCall;
use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("calldata decode failed: {0}")]
    Decode(#[from] alloy_sol_types::Error),
    #[error("INVALID_PATH")]
    InvalidPath,
    #[error("no tracked pool for {0}/{1}")]
    UnknownPool(Address, Address),
    #[error("INSUFFICIENT_OUTPUT_AMOUNT: {amount_out} < {amount_out_min}")]
    InsufficientOutputAmount { amount_out: U256, amount_out_min: U256 },
    #[error("EXCESSIVE_INPUT_AMOUNT: {amount_in} > {amount_in_max}")]
    ExcessiveInputAmount { amount_in: U256, amount_in_max: U256 },
    #[error("INSUFFICIENT_A_AMOUNT")]
    InsufficientAAmount,
    #[error("INSUFFICIENT_B_AMOUNT")]
    InsufficientBAmount,
    #[error("optimal amount {optimal} exceeds desired {desired}")]
    ExcessiveOptimalAmount { optimal: U256, desired: U256 },
    #[error(transparent)]
    Amm(#[from] AmmError),
}

/// Decodes router calldata and projects its effect on the exchange's pools.
///
/// `value` is the native amount attached to the transaction. Returns `Ok(None)` for calls
/// that do not move reserves.
pub fn project_calldata(input: &[u8], value: U256, exchange: &Exchange) -> Result<Option<ReserveOverlay>, ProjectionError> {
    let call = RouterCall::decode(input)?;
    project(&call, value, exchange)
}

/// Reserves of every pool on the call's path as if the call had already executed.
///
/// Amounts are quoted against the pre-transaction reserves, as the router does, and the
/// resulting deltas are accumulated into the overlay hop by hop.
pub fn project(call: &RouterCall, value: U256, exchange: &Exchange) -> Result<Option<ReserveOverlay>, ProjectionError> {
    let weth = exchange.get_wrapped_native();
    let overlay = match call {
        RouterCall::Unknown => return Ok(None),
        RouterCall::AddLiquidity(c) => add_liquidity(
            exchange,
            (c.tokenA, c.tokenB),
            (c.amountADesired, c.amountBDesired),
            (c.amountAMin, c.amountBMin),
        )?,
        RouterCall::SwapExactTokensForTokens(c) => exact_in(exchange, c.amountIn, c.amountOutMin, &c.path)?,
        RouterCall::SwapExactEthForTokens(c) => {
            require_first(&c.path, weth)?;
            exact_in(exchange, value, c.amountOutMin, &c.path)?
        }
        RouterCall::SwapExactTokensForEth(c) => {
            require_last(&c.path, weth)?;
            exact_in(exchange, c.amountIn, c.amountOutMin, &c.path)?
        }
        RouterCall::SwapTokensForExactTokens(c) => exact_out(exchange, c.amountOut, c.amountInMax, &c.path)?,
        RouterCall::SwapTokensForExactEth(c) => {
            require_last(&c.path, weth)?;
            exact_out(exchange, c.amountOut, c.amountInMax, &c.path)?
        }
        RouterCall::SwapEthForExactTokens(c) => {
            require_first(&c.path, weth)?;
            exact_out(exchange, c.amountOut, value, &c.path)?
        }
    };
    Ok(Some(overlay))
}

fn require_first(path: &[Address], token: Address) -> Result<(), ProjectionError> {
    if path.first() == Some(&token) { Ok(()) } else { Err(ProjectionError::InvalidPath) }
}

fn require_last(path: &[Address], token: Address) -> Result<(), ProjectionError> {
    if path.last() == Some(&token) { Ok(()) } else { Err(ProjectionError::InvalidPath) }
}

fn find_pool(exchange: &Exchange, token_a: Address, token_b: Address) -> Result<PoolWrapper, ProjectionError> {
    exchange.pools().get_by_tokens(token_a, token_b).ok_or(ProjectionError::UnknownPool(token_a, token_b))
}

/// Pool and direction for every consecutive token pair of `path`
fn resolve_hops(exchange: &Exchange, path: &[Address]) -> Result<Vec<(PoolWrapper, bool)>, ProjectionError> {
    if path.len() < 2 {
        return Err(ProjectionError::InvalidPath);
    }
    path.windows(2)
        .map(|pair| {
            let pool = find_pool(exchange, pair[0], pair[1])?;
            let zero_for_one = pool.zero_for_one(pair[0]).ok_or(ProjectionError::InvalidPath)?;
            Ok((pool, zero_for_one))
        })
        .collect()
}

fn exact_in(exchange: &Exchange, amount_in: U256, amount_out_min: U256, path: &[Address]) -> Result<ReserveOverlay, ProjectionError> {
    let hops = resolve_hops(exchange, path)?;

    let mut amounts = Vec::with_capacity(hops.len() + 1);
    amounts.push(amount_in);
    for (pool, zero_for_one) in &hops {
        let (reserve_in, reserve_out) = pool.get_reserves().oriented(*zero_for_one);
        let amount = amounts[amounts.len() - 1];
        amounts.push(pool.get_fee().get_amount_out(amount, reserve_in, reserve_out)?);
    }

    let amount_out = amounts[amounts.len() - 1];
    if amount_out < amount_out_min {
        return Err(ProjectionError::InsufficientOutputAmount { amount_out, amount_out_min });
    }
    apply_amounts(&hops, &amounts)
}

fn exact_out(exchange: &Exchange, amount_out: U256, amount_in_max: U256, path: &[Address]) -> Result<ReserveOverlay, ProjectionError> {
    let hops = resolve_hops(exchange, path)?;

    let mut amounts = vec![U256::ZERO; hops.len() + 1];
    amounts[hops.len()] = amount_out;
    for (i, (pool, zero_for_one)) in hops.iter().enumerate().rev() {
        let (reserve_in, reserve_out) = pool.get_reserves().oriented(*zero_for_one);
        amounts[i] = pool.get_fee().get_amount_in(amounts[i + 1], reserve_in, reserve_out)?;
    }

    let amount_in = amounts[0];
    if amount_in > amount_in_max {
        return Err(ProjectionError::ExcessiveInputAmount { amount_in, amount_in_max });
    }
    apply_amounts(&hops, &amounts)
}

/// Hop `i` receives `amounts[i]` and pays out `amounts[i + 1]`
fn apply_amounts(hops: &[(PoolWrapper, bool)], amounts: &[U256]) -> Result<ReserveOverlay, ProjectionError> {
    let mut overlay = ReserveOverlay::default();
    for (i, (pool, zero_for_one)) in hops.iter().enumerate() {
        let (reserve_in, reserve_out) = pool.balances(Some(&overlay)).oriented(*zero_for_one);
        let reserve_in = checked_add(reserve_in, amounts[i])?;
        let reserve_out = checked_sub(reserve_out, amounts[i + 1])?;
        overlay.insert(pool.get_address(), Reserves::from_oriented(reserve_in, reserve_out, *zero_for_one));
    }
    Ok(overlay)
}

/// Router `_addLiquidity`: an empty pool takes both desired amounts, otherwise the side
/// whose optimal counterpart fits within the other's desired amount is kept.
fn add_liquidity(
    exchange: &Exchange,
    (token_a, token_b): (Address, Address),
    (amount_a_desired, amount_b_desired): (U256, U256),
    (amount_a_min, amount_b_min): (U256, U256),
) -> Result<ReserveOverlay, ProjectionError> {
    let pool = find_pool(exchange, token_a, token_b)?;
    let a_is_token0 = pool.zero_for_one(token_a).ok_or(ProjectionError::InvalidPath)?;
    let (reserve_a, reserve_b) = pool.get_reserves().oriented(a_is_token0);

    let (amount_a, amount_b) = if reserve_a.is_zero() && reserve_b.is_zero() {
        (amount_a_desired, amount_b_desired)
    } else {
        let amount_b_optimal = quote(amount_a_desired, reserve_a, reserve_b)?;
        if amount_b_optimal <= amount_b_desired {
            if amount_b_optimal < amount_b_min {
                return Err(ProjectionError::InsufficientBAmount);
            }
            (amount_a_desired, amount_b_optimal)
        } else {
            let amount_a_optimal = quote(amount_b_desired, reserve_b, reserve_a)?;
            if amount_a_optimal > amount_a_desired {
                return Err(ProjectionError::ExcessiveOptimalAmount { optimal: amount_a_optimal, desired: amount_a_desired });
            }
            if amount_a_optimal < amount_a_min {
                return Err(ProjectionError::InsufficientAAmount);
            }
            (amount_a_optimal, amount_b_desired)
        }
    };

    let mut overlay = ReserveOverlay::default();
    overlay.insert(
        pool.get_address(),
        Reserves::from_oriented(checked_add(reserve_a, amount_a)?, checked_add(reserve_b, amount_b)?, a_is_token0),
    );
    Ok(overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::amm::FeeModel;
    use crate::logic::pool::Pool;
    use crate::logic::router::IUniswapV2Router02::*;
    use crate::utils::Token;
    use alloy_sol_types::SolCall;
    use std::sync::Arc;

    const A: u8 = 0x0a;
    const B: u8 = 0x0b;
    const C: u8 = 0x0c;
    const D: u8 = 0x0d;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    fn add_pool(exchange: &Exchange, address: u8, token_a: u8, token_b: u8, reserve_a: u64, reserve_b: u64) -> PoolWrapper {
        exchange.pools().get_or_insert(Arc::new(Pool::new(
            addr(address),
            exchange.get_name(),
            exchange.get_fee(),
            Arc::new(Token::repeat_byte(token_a)),
            Arc::new(Token::repeat_byte(token_b)),
            Reserves::new(u(reserve_a), u(reserve_b)),
        )))
    }

    /// A is the wrapped native token
    fn exchange() -> Exchange {
        let exchange = Exchange::new("test", addr(0xee), addr(0xff), addr(A), FeeModel::UNISWAP_V2);
        add_pool(&exchange, 0x01, A, B, 100_000, 100_000);
        add_pool(&exchange, 0x02, B, C, 50_000, 200_000);
        add_pool(&exchange, 0x03, A, C, 10_000, 10_000);
        add_pool(&exchange, 0x04, A, D, 0, 0);
        exchange
    }

    fn path(tokens: &[u8]) -> Vec<Address> {
        tokens.iter().map(|t| addr(*t)).collect()
    }

    #[test]
    fn test_unknown_call_has_no_overlay() {
        let exchange = exchange();
        assert!(project_calldata(&[0xa9, 0x05, 0x9c, 0xbb], U256::ZERO, &exchange).unwrap().is_none());
        assert!(project_calldata(&[], U256::ZERO, &exchange).unwrap().is_none());
    }

    #[test]
    fn test_exact_in_walks_forward() {
        let exchange = exchange();
        let call = swapExactTokensForTokensCall {
            amountIn: u(1000),
            amountOutMin: u(3860),
            path: path(&[A, B, C]),
            to: addr(0x99),
            deadline: U256::MAX,
        };
        let overlay = project_calldata(&call.abi_encode(), U256::ZERO, &exchange).unwrap().unwrap();

        assert_eq!(overlay.len(), 2);
        assert_eq!(overlay.get(&addr(0x01)), Some(&Reserves::new(u(101_000), u(99_013))));
        assert_eq!(overlay.get(&addr(0x02)), Some(&Reserves::new(u(50_987), u(196_140))));
        assert!(!overlay.contains(&addr(0x03)));
        // authoritative reserves stay untouched
        assert_eq!(exchange.pools().get_by_address(&addr(0x01)).unwrap().get_reserves(), Reserves::new(u(100_000), u(100_000)));
    }

    #[test]
    fn test_exact_in_slippage_violation() {
        let exchange = exchange();
        let call = swapExactTokensForTokensCall {
            amountIn: u(1000),
            amountOutMin: u(3861),
            path: path(&[A, B, C]),
            to: addr(0x99),
            deadline: U256::MAX,
        };
        let err = project(&RouterCall::SwapExactTokensForTokens(call), U256::ZERO, &exchange).unwrap_err();
        assert!(matches!(err, ProjectionError::InsufficientOutputAmount { amount_out, .. } if amount_out == u(3860)));
    }

    #[test]
    fn test_exact_out_walks_backward() {
        let exchange = exchange();
        let call = swapTokensForExactTokensCall {
            amountOut: u(3000),
            amountInMax: u(773),
            path: path(&[A, B, C]),
            to: addr(0x99),
            deadline: U256::MAX,
        };
        let overlay = project(&RouterCall::SwapTokensForExactTokens(call.clone()), U256::ZERO, &exchange).unwrap().unwrap();
        assert_eq!(overlay.get(&addr(0x01)), Some(&Reserves::new(u(100_773), u(100_000 - 764))));
        assert_eq!(overlay.get(&addr(0x02)), Some(&Reserves::new(u(50_764), u(197_000))));

        let too_tight = swapTokensForExactTokensCall { amountInMax: u(772), ..call };
        let err = project(&RouterCall::SwapTokensForExactTokens(too_tight), U256::ZERO, &exchange).unwrap_err();
        assert!(matches!(err, ProjectionError::ExcessiveInputAmount { amount_in, .. } if amount_in == u(773)));
    }

    #[test]
    fn test_native_value_replaces_first_leg() {
        let exchange = exchange();
        let call = swapExactETHForTokensCall { amountOutMin: U256::ZERO, path: path(&[A, B]), to: addr(0x99), deadline: U256::MAX };
        let overlay = project(&RouterCall::SwapExactEthForTokens(call), u(1000), &exchange).unwrap().unwrap();
        assert_eq!(overlay.get(&addr(0x01)), Some(&Reserves::new(u(101_000), u(99_013))));

        let exact_out = swapETHForExactTokensCall { amountOut: u(987), path: path(&[A, B]), to: addr(0x99), deadline: U256::MAX };
        let err = project(&RouterCall::SwapEthForExactTokens(exact_out), u(900), &exchange).unwrap_err();
        assert!(matches!(err, ProjectionError::ExcessiveInputAmount { .. }));
    }

    #[test]
    fn test_native_legs_require_wrapped_native() {
        let exchange = exchange();
        let starts_wrong = swapExactETHForTokensCall { amountOutMin: U256::ZERO, path: path(&[B, C]), to: addr(0x99), deadline: U256::MAX };
        assert!(matches!(
            project(&RouterCall::SwapExactEthForTokens(starts_wrong), u(1000), &exchange),
            Err(ProjectionError::InvalidPath)
        ));

        let ends_wrong =
            swapExactTokensForETHCall { amountIn: u(10), amountOutMin: U256::ZERO, path: path(&[A, B]), to: addr(0x99), deadline: U256::MAX };
        assert!(matches!(
            project(&RouterCall::SwapExactTokensForEth(ends_wrong), U256::ZERO, &exchange),
            Err(ProjectionError::InvalidPath)
        ));

        let exact_eth_out =
            swapTokensForExactETHCall { amountOut: u(10), amountInMax: U256::MAX, path: path(&[B, A]), to: addr(0x99), deadline: U256::MAX };
        assert!(project(&RouterCall::SwapTokensForExactEth(exact_eth_out), U256::ZERO, &exchange).unwrap().is_some());
    }

    #[test]
    fn test_invalid_paths() {
        let exchange = exchange();
        let short =
            swapExactTokensForTokensCall { amountIn: u(10), amountOutMin: U256::ZERO, path: path(&[A]), to: addr(0x99), deadline: U256::MAX };
        assert!(matches!(project(&RouterCall::SwapExactTokensForTokens(short), U256::ZERO, &exchange), Err(ProjectionError::InvalidPath)));

        let untracked =
            swapExactTokensForTokensCall { amountIn: u(10), amountOutMin: U256::ZERO, path: path(&[B, D]), to: addr(0x99), deadline: U256::MAX };
        assert!(matches!(
            project(&RouterCall::SwapExactTokensForTokens(untracked), U256::ZERO, &exchange),
            Err(ProjectionError::UnknownPool(..))
        ));

        let zero =
            swapExactTokensForTokensCall { amountIn: U256::ZERO, amountOutMin: U256::ZERO, path: path(&[A, B]), to: addr(0x99), deadline: U256::MAX };
        assert!(matches!(
            project(&RouterCall::SwapExactTokensForTokens(zero), U256::ZERO, &exchange),
            Err(ProjectionError::Amm(AmmError::InsufficientInputAmount))
        ));
    }

    fn add_liquidity_call(token_a: u8, token_b: u8, desired: (u64, u64), min: (u64, u64)) -> RouterCall {
        RouterCall::AddLiquidity(addLiquidityCall {
            tokenA: addr(token_a),
            tokenB: addr(token_b),
            amountADesired: u(desired.0),
            amountBDesired: u(desired.1),
            amountAMin: u(min.0),
            amountBMin: u(min.1),
            to: addr(0x99),
            deadline: U256::MAX,
        })
    }

    #[test]
    fn test_add_liquidity_empty_pool_takes_desired_amounts() {
        let exchange = exchange();
        let overlay = project(&add_liquidity_call(D, A, (7, 1000), (7, 1000)), U256::ZERO, &exchange).unwrap().unwrap();
        // token order is A, D
        assert_eq!(overlay.get(&addr(0x04)), Some(&Reserves::new(u(1000), u(7))));
    }

    #[test]
    fn test_add_liquidity_keeps_a_when_b_fits() {
        let exchange = exchange();
        let overlay = project(&add_liquidity_call(B, C, (1000, 5000), (0, 0)), U256::ZERO, &exchange).unwrap().unwrap();
        assert_eq!(overlay.get(&addr(0x02)), Some(&Reserves::new(u(51_000), u(204_000))));

        let err = project(&add_liquidity_call(B, C, (1000, 5000), (0, 4001)), U256::ZERO, &exchange).unwrap_err();
        assert!(matches!(err, ProjectionError::InsufficientBAmount));
    }

    #[test]
    fn test_add_liquidity_keeps_b_when_a_fits() {
        let exchange = exchange();
        let overlay = project(&add_liquidity_call(C, B, (5000, 1000), (0, 0)), U256::ZERO, &exchange).unwrap().unwrap();
        assert_eq!(overlay.get(&addr(0x02)), Some(&Reserves::new(u(51_000), u(204_000))));

        let err = project(&add_liquidity_call(C, B, (5000, 1000), (4001, 0)), U256::ZERO, &exchange).unwrap_err();
        assert!(matches!(err, ProjectionError::InsufficientAAmount));
    }

    #[test]
    fn test_add_liquidity_exact_ratio_uses_first_branch() {
        let exchange = exchange();
        let overlay = project(&add_liquidity_call(B, C, (1000, 4000), (1000, 4000)), U256::ZERO, &exchange).unwrap().unwrap();
        assert_eq!(overlay.get(&addr(0x02)), Some(&Reserves::new(u(51_000), u(204_000))));
    }
}
