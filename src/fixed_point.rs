//! 1e18 fixed-point helpers.
//!
//! Every product is formed in 256 bits and divided last, so intermediate
//! results never overflow and every quotient rounds toward zero.

use alloy_primitives::U256;

/// 1.0 at 18 decimals.
pub const WAD: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("division by zero")]
    DivisionByZero,
}

fn narrow(value: U256) -> Result<u128, MathError> {
    u128::try_from(value).map_err(|_| MathError::ArithmeticOverflow)
}

/// (a * b) / denominator
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    narrow(product / U256::from(denominator))
}

/// (a * b * c) / denominator. the three-factor form used for time-prorated rates.
pub fn mul_mul_div(a: u128, b: u128, c: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = (U256::from(a) * U256::from(b))
        .checked_mul(U256::from(c))
        .ok_or(MathError::ArithmeticOverflow)?;
    narrow(product / U256::from(denominator))
}

/// (a * b) / WAD
pub fn mul_wad(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div(a, b, WAD)
}

/// (a * WAD) / b
pub fn div_wad(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div(a, WAD, b)
}
