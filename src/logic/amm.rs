use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("INSUFFICIENT_INPUT_AMOUNT")]
    InsufficientInputAmount,
    #[error("INSUFFICIENT_OUTPUT_AMOUNT")]
    InsufficientOutputAmount,
    #[error("INSUFFICIENT_AMOUNT")]
    InsufficientAmount,
    #[error("INSUFFICIENT_LIQUIDITY")]
    InsufficientLiquidity,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("division by zero")]
    DivisionByZero,
    #[error("fee {fee} must be lower than fee base {fee_base}")]
    InvalidFee { fee: U256, fee_base: U256 },
}

/// Constant-product fee expressed as `fee / fee_base` of the input amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeModel {
    pub fee: U256,
    pub fee_base: U256,
}

impl Default for FeeModel {
    fn default() -> Self {
        Self::UNISWAP_V2
    }
}

impl FeeModel {
    /// 0.3%
    pub const UNISWAP_V2: FeeModel = FeeModel { fee: U256::from_limbs([3, 0, 0, 0]), fee_base: U256::from_limbs([1000, 0, 0, 0]) };

    pub fn new(fee: U256, fee_base: U256) -> Result<Self, AmmError> {
        if fee_base.is_zero() || fee >= fee_base {
            return Err(AmmError::InvalidFee { fee, fee_base });
        }
        Ok(Self { fee, fee_base })
    }

    /// The share of the input that reaches the curve, `fee_base - fee`
    pub fn multiplier(&self) -> U256 {
        self.fee_base - self.fee
    }

    /// Forward quote:
    /// `floor(amountIn * (feeBase - fee) * reserveOut / (reserveIn * feeBase + amountIn * (feeBase - fee)))`
    pub fn get_amount_out(&self, amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256, AmmError> {
        if amount_in.is_zero() {
            return Err(AmmError::InsufficientInputAmount);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }
        let amount_in_with_fee = checked_mul(amount_in, self.multiplier())?;
        let numerator = checked_mul(amount_in_with_fee, reserve_out)?;
        let denominator = checked_add(checked_mul(reserve_in, self.fee_base)?, amount_in_with_fee)?;
        checked_div(numerator, denominator)
    }

    /// Reverse quote:
    /// `floor(reserveIn * amountOut * feeBase / ((reserveOut - amountOut) * (feeBase - fee))) + 1`
    pub fn get_amount_in(&self, amount_out: U256, reserve_in: U256, reserve_out: U256) -> Result<U256, AmmError> {
        if amount_out.is_zero() {
            return Err(AmmError::InsufficientOutputAmount);
        }
        if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity);
        }
        let numerator = checked_mul(checked_mul(reserve_in, amount_out)?, self.fee_base)?;
        let denominator = checked_mul(checked_sub(reserve_out, amount_out)?, self.multiplier())?;
        checked_add(checked_div(numerator, denominator)?, U256::from(1))
    }
}

/// Amount of B with the same value as `amount_a` at the current pool ratio, no fee applied.
pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> Result<U256, AmmError> {
    if amount_a.is_zero() {
        return Err(AmmError::InsufficientAmount);
    }
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(AmmError::InsufficientLiquidity);
    }
    checked_div(checked_mul(amount_a, reserve_b)?, reserve_a)
}

pub(crate) fn checked_mul(a: U256, b: U256) -> Result<U256, AmmError> {
    a.checked_mul(b).ok_or(AmmError::Overflow)
}

pub(crate) fn checked_add(a: U256, b: U256) -> Result<U256, AmmError> {
    a.checked_add(b).ok_or(AmmError::Overflow)
}

pub(crate) fn checked_sub(a: U256, b: U256) -> Result<U256, AmmError> {
    a.checked_sub(b).ok_or(AmmError::Underflow)
}

pub(crate) fn checked_div(a: U256, b: U256) -> Result<U256, AmmError> {
    a.checked_div(b).ok_or(AmmError::DivisionByZero)
}
