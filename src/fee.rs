// 2.0 fee.rs: cost of lending into a fixed-term market.
// 2.1 the fee is a flat annual rate prorated by how much of the tenor is left.
// entering on day one of any tenor pays the full rate, halfway pays half, at maturity pays nothing.

use crate::fixed_point::{self, MathError, WAD};
use crate::types::{is_known_tenor, Amount, Rate, Timestamp, SECONDS_PER_MONTH};
use serde::{Deserialize, Serialize};

/// 0.30% per year
pub const DEFAULT_ANNUAL_FEE: Rate = Rate(3_000_000_000_000_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    #[error("invalid tenor: {0} months is not on the tenor ladder")]
    InvalidTenor(u16),

    #[error("fee math: {0}")]
    Math(#[from] MathError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFeeModel {
    annual_fee: Rate,
}

impl Default for EntryFeeModel {
    fn default() -> Self {
        Self {
            annual_fee: DEFAULT_ANNUAL_FEE,
        }
    }
}

impl EntryFeeModel {
    // a fee rate of 100% or more could eat the whole deposit
    #[must_use]
    pub fn new(annual_fee: Rate) -> Option<Self> {
        if annual_fee.wad() < WAD {
            Some(Self { annual_fee })
        } else {
            None
        }
    }

    pub fn annual_fee(&self) -> Rate {
        self.annual_fee
    }

    /// 2.2: fee = amount * annual_fee * remaining / (WAD * tenor_secs)
    ///
    /// `remaining` is capped at the tenor length so a market quoted before its
    /// nominal start never costs more than the full rate.
    pub fn cost(
        &self,
        deposit: Amount,
        maturity: Timestamp,
        tenor_months: u16,
        now: Timestamp,
    ) -> Result<Amount, FeeError> {
        if !is_known_tenor(tenor_months) {
            return Err(FeeError::InvalidTenor(tenor_months));
        }

        let tenor_secs = u64::from(tenor_months) * SECONDS_PER_MONTH;
        let remaining = now.secs_until(maturity).min(tenor_secs);
        if remaining == 0 || deposit.is_zero() {
            return Ok(Amount::ZERO);
        }

        let denominator = WAD
            .checked_mul(u128::from(tenor_secs))
            .ok_or(MathError::ArithmeticOverflow)?;
        let fee = fixed_point::mul_mul_div(
            deposit.units(),
            self.annual_fee.wad(),
            u128::from(remaining),
            denominator,
        )?;

        Ok(Amount(fee.min(deposit.units())))
    }
}
