// 5.0: one account's claim on one maturity. lent = claim units held in custody,
// deposited = principal net of entry fees. rate = present value / deposited.
// 5.1 has the proration used by withdraw and transfer at the bottom.

use crate::fixed_point::MathError;
use crate::types::{Amount, Rate, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub lent_amount: Amount,
    pub deposited_amount: Amount,
    pub maturity: Timestamp,
    pub tenor_months: u16,
}

impl Position {
    pub fn new(maturity: Timestamp, tenor_months: u16) -> Self {
        Self {
            lent_amount: Amount::ZERO,
            deposited_amount: Amount::ZERO,
            maturity,
            tenor_months,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lent_amount.is_zero()
    }

    pub fn has_matured(&self, now: Timestamp) -> bool {
        self.maturity.has_passed(now)
    }

    pub fn add(&mut self, lent: Amount, deposited: Amount) -> Result<(), MathError> {
        self.lent_amount = self.lent_amount.checked_add(lent)?;
        self.deposited_amount = self.deposited_amount.checked_add(deposited)?;
        Ok(())
    }

    pub fn remove(&mut self, lent: Amount, deposited: Amount) -> Result<(), MathError> {
        self.lent_amount = self.lent_amount.checked_sub(lent)?;
        self.deposited_amount = self.deposited_amount.checked_sub(deposited)?;
        Ok(())
    }

    // 5.2: value per unit of principal. None when the principal basis is zero (dust)
    pub fn rate(&self, present_value: Amount) -> Result<Option<Rate>, MathError> {
        if self.deposited_amount.is_zero() {
            return Ok(None);
        }
        present_value.ratio_to(self.deposited_amount).map(Some)
    }
}

/// The part of one position that a withdraw or transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSlice {
    pub maturity: Timestamp,
    pub tenor_months: u16,
    pub lent: Amount,
    pub deposited: Amount,
    /// the whole position is consumed
    pub closes: bool,
}

/// 5.3: split `amount` wrapper units across `positions` in proportion to each
/// position's share of the total.
///
/// pct = amount / total at 1e18 scale drives the principal basis. Claim units
/// are allocated sequentially against what is still unallocated, so the slices
/// sum to exactly `amount` and each slice is within one unit of pct * lent.
/// At pct == 1 every slice is the whole position.
pub fn prorate(positions: &[Position], amount: Amount) -> Result<Vec<PositionSlice>, MathError> {
    let total = Amount::checked_sum(positions.iter().map(|p| p.lent_amount))?;
    if amount > total {
        return Err(MathError::ArithmeticOverflow);
    }
    if amount.is_zero() {
        return Ok(Vec::new());
    }

    let pct = amount.ratio_to(total)?;
    let mut unallocated = amount;
    let mut unvisited = total;
    let mut slices = Vec::with_capacity(positions.len());

    for position in positions {
        let lent = position.lent_amount.mul_div(unallocated, unvisited)?;
        unallocated = unallocated.checked_sub(lent)?;
        unvisited = unvisited.checked_sub(position.lent_amount)?;

        let closes = lent == position.lent_amount;
        // principal only moves together with claims, never as a claimless dust position
        let deposited = if closes {
            position.deposited_amount
        } else if lent.is_zero() {
            Amount::ZERO
        } else {
            position.deposited_amount.mul_rate(pct)?
        };

        if !lent.is_zero() {
            slices.push(PositionSlice {
                maturity: position.maturity,
                tenor_months: position.tenor_months,
                lent,
                deposited,
                closes,
            });
        }
    }

    debug_assert!(unallocated.is_zero());
    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(maturity_days: u64, lent: u128, deposited: u128) -> Position {
        Position {
            lent_amount: Amount::new(lent),
            deposited_amount: Amount::new(deposited),
            maturity: Timestamp::from_days(maturity_days),
            tenor_months: 3,
        }
    }

    #[test]
    fn half_of_two_positions() {
        let positions = [position(90, 600, 580), position(180, 400, 390)];
        let slices = prorate(&positions, Amount::new(500)).unwrap();

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].lent, Amount::new(300));
        assert_eq!(slices[0].deposited, Amount::new(290));
        assert_eq!(slices[1].lent, Amount::new(200));
        assert_eq!(slices[1].deposited, Amount::new(195));
        assert!(!slices[0].closes && !slices[1].closes);
    }

    #[test]
    fn full_amount_closes_everything() {
        let positions = [position(90, 601, 580), position(180, 399, 390)];
        let slices = prorate(&positions, Amount::new(1000)).unwrap();
        assert!(slices.iter().all(|s| s.closes));
        assert_eq!(slices[0].deposited, Amount::new(580));
        assert_eq!(slices[1].deposited, Amount::new(390));
    }

    #[test]
    fn slices_sum_exactly_to_amount() {
        let positions = [position(90, 7, 7), position(180, 11, 10), position(270, 13, 13)];
        for amount in 1..=31u128 {
            let slices = prorate(&positions, Amount::new(amount)).unwrap();
            let moved: u128 = slices.iter().map(|s| s.lent.units()).sum();
            assert_eq!(moved, amount);
            for slice in &slices {
                let pos = positions.iter().find(|p| p.maturity == slice.maturity).unwrap();
                assert!(slice.lent <= pos.lent_amount);
            }
        }
    }

    #[test]
    fn overflowing_total_rejected() {
        let positions = [position(90, u128::MAX, 0), position(180, 1, 1)];
        assert_eq!(prorate(&positions, Amount::new(1)), Err(MathError::ArithmeticOverflow));
    }

    #[test]
    fn amount_above_total_rejected() {
        let positions = [position(90, 10, 10)];
        assert!(prorate(&positions, Amount::new(11)).is_err());
    }

    #[test]
    fn rate_of_position() {
        let p = position(90, 1010, 1000);
        let rate = p.rate(Amount::new(1010)).unwrap().unwrap();
        assert_eq!(rate, Rate::from_wad(1_010_000_000_000_000_000));
        assert_eq!(position(90, 5, 0).rate(Amount::new(5)).unwrap(), None);
    }
}
