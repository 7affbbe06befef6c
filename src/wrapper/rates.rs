//! Rate reporting.
//!
//! Two aggregations of "value per unit of principal":
//! `ref_per_tok` averages per-position rates for one account (each maturity
//! counts once, however large), while `pooled_ref_per_tok` divides the pool's
//! total present value by its total principal. The collateral reads the pooled one.

use super::core::FixedTermWrapper;
use super::results::WrapperError;
use crate::collateral::RateSource;
use crate::position::Position;
use crate::types::{AccountId, Amount, Rate};
use crate::venue::Venue;

impl<V: Venue> FixedTermWrapper<V> {
    // matured positions are worth face value
    fn position_value(&self, position: &Position) -> Result<Amount, WrapperError> {
        if position.has_matured(self.current_time) {
            return Ok(position.lent_amount);
        }
        Ok(self.venue.present_value(
            self.catalog.currency(),
            position.maturity,
            position.lent_amount,
            self.current_time,
        )?)
    }

    /// Unweighted mean of present value / principal over `account`'s positions.
    /// Zero for an account without positions.
    pub fn ref_per_tok(&self, account: AccountId) -> Result<Rate, WrapperError> {
        let mut sum = Rate::ZERO;
        let mut counted: u128 = 0;
        for position in self.ledger.positions_of(account) {
            let value = self.position_value(&position)?;
            if let Some(rate) = position.rate(value)? {
                sum = sum.checked_add(rate)?;
                counted += 1;
            }
        }
        if counted == 0 {
            return Ok(Rate::ZERO);
        }
        Ok(Rate::from_wad(sum.wad() / counted))
    }

    /// Σ present value / Σ principal over every open position. An empty pool is at par.
    pub fn pooled_ref_per_tok(&self) -> Result<Rate, WrapperError> {
        let mut value = Amount::ZERO;
        let mut principal = Amount::ZERO;
        for position in self.ledger.all_positions() {
            value = value.checked_add(self.position_value(position)?)?;
            principal = principal.checked_add(position.deposited_amount)?;
        }
        if principal.is_zero() {
            return Ok(Rate::ONE);
        }
        Ok(value.ratio_to(principal)?)
    }
}

impl<V: Venue> RateSource for FixedTermWrapper<V> {
    fn actual_ref_per_tok(&self) -> Result<Rate, WrapperError> {
        self.pooled_ref_per_tok()
    }
}
