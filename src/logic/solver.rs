use super::amm::{AmmError, FeeModel, checked_add, checked_div, checked_mul, checked_sub};
use super::overlay::ReserveOverlay;
use super::route::Route;
use alloy_primitives::U256;

/// Folds every hop after the first into a single virtual pair `(Ea, Eb)` seen from the route's input token.
///
/// For each next hop with reserves `(Rb1, Rc)` and fee multiplier `m = feeBase - fee`:
/// ```text
/// denom = feeBase * Rb1 + m * Eb
/// Ea'   = feeBase * Ea * Rb1 / denom
/// Eb'   = m * Eb * Rc / denom
/// ```
pub fn effective_reserves(route: &Route, overlay: Option<&ReserveOverlay>) -> Result<(U256, U256), AmmError> {
    let Some((first, rest)) = route.swaps.split_first() else {
        return Ok((U256::ZERO, U256::ZERO));
    };

    let (mut ea, mut eb) = first.reserves(overlay);
    for swap in rest {
        let (rb1, rc) = swap.reserves(overlay);
        let fee = swap.pool.get_fee();
        let denom = checked_add(checked_mul(fee.fee_base, rb1)?, checked_mul(fee.multiplier(), eb)?)?;
        let next_ea = checked_div(checked_mul(checked_mul(fee.fee_base, ea)?, rb1)?, denom)?;
        let next_eb = checked_div(checked_mul(checked_mul(fee.multiplier(), eb)?, rc)?, denom)?;
        ea = next_ea;
        eb = next_eb;
    }
    Ok((ea, eb))
}

/// Input maximizing `amountOut(x) - x` on a single pair `(ea, eb)`:
/// `floor((sqrt(ea * eb * m * feeBase) - ea * feeBase) / m)`.
///
/// Zero when `ea >= eb` or when any step overflows or underflows.
pub fn optimal_amount_in(ea: U256, eb: U256, fee: FeeModel) -> U256 {
    if ea >= eb {
        return U256::ZERO;
    }
    let solve = || -> Result<U256, AmmError> {
        let product = checked_mul(checked_mul(checked_mul(ea, eb)?, fee.multiplier())?, fee.fee_base)?;
        let root = product.root(2);
        let numerator = checked_sub(root, checked_mul(ea, fee.fee_base)?)?;
        checked_div(numerator, fee.multiplier())
    };
    solve().unwrap_or(U256::ZERO)
}

/// Profit-maximizing input for a cyclic route, before the capital ceiling is applied
pub fn optimal_input(route: &Route, overlay: Option<&ReserveOverlay>) -> U256 {
    let Some(first) = route.swaps.first() else {
        return U256::ZERO;
    };
    match effective_reserves(route, overlay) {
        Ok((ea, eb)) => optimal_amount_in(ea, eb, first.pool.get_fee()),
        Err(_) => U256::ZERO,
    }
}

/// Optimal input capped by the capital available to the executing contract
pub fn optimal_input_clamped(route: &Route, overlay: Option<&ReserveOverlay>, capital: U256) -> U256 {
    optimal_input(route, overlay).min(capital)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::pool::{Pool, PoolWrapper, Reserves};
    use crate::logic::route::Swap;
    use crate::utils::Token;
    use alloy_primitives::Address;
    use std::sync::Arc;

    fn pool(address: u8, reserve0: u64, reserve1: u64) -> PoolWrapper {
        Arc::new(Pool::new(
            Address::repeat_byte(address),
            "test",
            FeeModel::UNISWAP_V2,
            Arc::new(Token::repeat_byte(0x01)),
            Arc::new(Token::repeat_byte(0x02)),
            Reserves::new(U256::from(reserve0), U256::from(reserve1)),
        ))
    }

    fn two_hop(p1: &PoolWrapper, p2: &PoolWrapper) -> Route {
        Route::new(vec![Swap::new(p1.clone(), true), Swap::new(p2.clone(), false)])
    }

    #[test]
    fn test_golden_two_hop() {
        let route = two_hop(&pool(0x10, 100_000, 100_000), &pool(0x11, 120_000, 100_000));

        assert_eq!(effective_reserves(&route, None).unwrap(), (U256::from(50_075), U256::from(59_909)));
        assert_eq!(optimal_input(&route, None), U256::from(4628));
        assert_eq!(optimal_input_clamped(&route, None, U256::from(1000)), U256::from(1000));
        assert_eq!(optimal_input_clamped(&route, None, U256::MAX), U256::from(4628));
    }

    #[test]
    fn test_balanced_pools_have_no_profitable_size() {
        let route = two_hop(&pool(0x10, 100_000, 100_000), &pool(0x11, 100_000, 100_000));
        let (ea, eb) = effective_reserves(&route, None).unwrap();
        assert!(ea >= eb);
        assert_eq!(optimal_input(&route, None), U256::ZERO);
    }

    #[test]
    fn test_zero_guard() {
        let fee = FeeModel::UNISWAP_V2;
        assert_eq!(optimal_amount_in(U256::from(10), U256::from(10), fee), U256::ZERO);
        assert_eq!(optimal_amount_in(U256::from(11), U256::from(10), fee), U256::ZERO);
        // profitable pair where the fee eats the whole spread
        assert_eq!(optimal_amount_in(U256::from(1000), U256::from(1001), fee), U256::ZERO);
    }

    #[test]
    fn test_decreasing_in_ea_when_close_to_eb() {
        let fee = FeeModel::UNISWAP_V2;
        let eb = U256::from(10).pow(U256::from(18));
        let step = U256::from(10).pow(U256::from(16));

        let mut ea = U256::from(30) * step;
        let mut previous = optimal_amount_in(ea, eb, fee);
        while ea + step < eb {
            ea += step;
            let current = optimal_amount_in(ea, eb, fee);
            assert!(current < previous, "ea={ea} current={current} previous={previous}");
            previous = current;
        }
    }

    #[test]
    fn test_overlay_moves_the_optimum() {
        let p1 = pool(0x10, 100_000, 100_000);
        let p2 = pool(0x11, 100_000, 100_000);
        let route = two_hop(&p1, &p2);
        assert_eq!(optimal_input(&route, None), U256::ZERO);

        let mut overlay = ReserveOverlay::default();
        overlay.insert(p2.get_address(), Reserves::new(U256::from(120_000), U256::from(100_000)));
        assert_eq!(optimal_input(&route, Some(&overlay)), U256::from(4628));
    }
}
