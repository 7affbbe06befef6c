// 1.0: all the primitives live here. nothing in the ledger works without these types.
// IDs, amounts, rates, timestamps. each is a newtype so the compiler catches unit mixups.

use crate::fixed_point::{self, MathError, WAD};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

// venue-side identifier of the lent instrument (one underlying currency)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyId(pub u16);

pub const SECONDS_PER_DAY: u64 = 86_400;
// tenors are counted in 30 day months
pub const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;
// venue interest accrues on a 360 day year
pub const SECONDS_PER_YEAR: u64 = 360 * SECONDS_PER_DAY;

// 1.1: second resolution timestamp. maturities are timestamps too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn from_days(days: u64) -> Self {
        Self(days.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds from `self` until `later`, zero once `later` is in the past.
    pub fn secs_until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }

    pub fn has_passed(&self, now: Timestamp) -> bool {
        self.0 <= now.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: native-unit amount. underlying, claim units and wrapper units all use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn new(units: u128) -> Self {
        Self(units)
    }

    /// Whole tokens scaled up by `decimals`. `Amount::whole(1_000, 6)` is 1000.000000.
    pub fn whole(tokens: u64, decimals: u32) -> Result<Amount, MathError> {
        10u128
            .checked_pow(decimals)
            .and_then(|scale| u128::from(tokens).checked_mul(scale))
            .map(Amount)
            .ok_or(MathError::ArithmeticOverflow)
    }

    /// Sum that fails instead of wrapping or saturating.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Result<Amount, MathError> {
        amounts.into_iter().try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }

    pub fn units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Result<Amount, MathError> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(MathError::ArithmeticOverflow)
    }

    pub fn checked_sub(&self, other: Amount) -> Result<Amount, MathError> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(MathError::ArithmeticOverflow)
    }

    /// amount * rate, rounded toward zero
    pub fn mul_rate(&self, rate: Rate) -> Result<Amount, MathError> {
        fixed_point::mul_wad(self.0, rate.0).map(Amount)
    }

    /// self * numerator / denominator with a 256-bit intermediate
    pub fn mul_div(&self, numerator: Amount, denominator: Amount) -> Result<Amount, MathError> {
        fixed_point::mul_div(self.0, numerator.0, denominator.0).map(Amount)
    }

    /// self / other as a 1e18 ratio
    pub fn ratio_to(&self, other: Amount) -> Result<Rate, MathError> {
        fixed_point::div_wad(self.0, other.0).map(Rate)
    }

    pub fn to_decimal(&self, decimals: u32) -> Result<Decimal, MathError> {
        let raw = i128::try_from(self.0).map_err(|_| MathError::ArithmeticOverflow)?;
        Decimal::try_from_i128_with_scale(raw, decimals).map_err(|_| MathError::ArithmeticOverflow)
    }

    /// Truncates digits past `decimals`. Negative input is rejected.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Amount, MathError> {
        let mut scaled = value;
        for _ in 0..decimals {
            scaled = scaled.checked_mul(Decimal::TEN).ok_or(MathError::ArithmeticOverflow)?;
        }
        if scaled.is_sign_negative() {
            return Err(MathError::ArithmeticOverflow);
        }
        scaled.trunc().to_u128().map(Amount).ok_or(MathError::ArithmeticOverflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: 1e18 fixed-point rate. exchange rates, interest rates, fee rates, margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Rate(pub u128);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    pub const ONE: Rate = Rate(WAD);

    pub fn from_wad(raw: u128) -> Self {
        Self(raw)
    }

    pub fn wad(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn mul(&self, other: Rate) -> Result<Rate, MathError> {
        fixed_point::mul_wad(self.0, other.0).map(Rate)
    }

    pub fn checked_add(&self, other: Rate) -> Result<Rate, MathError> {
        self.0
            .checked_add(other.0)
            .map(Rate)
            .ok_or(MathError::ArithmeticOverflow)
    }

    pub fn checked_sub(&self, other: Rate) -> Result<Rate, MathError> {
        self.0
            .checked_sub(other.0)
            .map(Rate)
            .ok_or(MathError::ArithmeticOverflow)
    }

    // 0.99 → 990000000000000000. digits past the 18th are dropped.
    pub fn from_decimal(value: Decimal) -> Result<Rate, MathError> {
        if value.is_sign_negative() {
            return Err(MathError::ArithmeticOverflow);
        }
        value
            .checked_mul(Decimal::from(WAD as u64))
            .ok_or(MathError::ArithmeticOverflow)?
            .trunc()
            .to_u128()
            .map(Rate)
            .ok_or(MathError::ArithmeticOverflow)
    }

    pub fn to_decimal(&self) -> Result<Decimal, MathError> {
        let raw = i128::try_from(self.0).map_err(|_| MathError::ArithmeticOverflow)?;
        Decimal::try_from_i128_with_scale(raw, 18)
            .map(|d| d.normalize())
            .map_err(|_| MathError::ArithmeticOverflow)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(d) => write!(f, "{}", d),
            Err(_) => write!(f, "{}e-18", self.0),
        }
    }
}

// 1.4: the venue's standard tenor ladder. market ordinal 1 is the 3 month market.
pub const TENOR_LADDER_MONTHS: [u16; 7] = [3, 6, 12, 24, 60, 120, 240];

pub fn tenor_from_ordinal(ordinal: u8) -> Option<u16> {
    let index = usize::from(ordinal).checked_sub(1)?;
    TENOR_LADDER_MONTHS.get(index).copied()
}

pub fn is_known_tenor(months: u16) -> bool {
    TENOR_LADDER_MONTHS.contains(&months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn tenor_ladder_lookup() {
        assert_eq!(tenor_from_ordinal(1), Some(3));
        assert_eq!(tenor_from_ordinal(7), Some(240));
        assert_eq!(tenor_from_ordinal(0), None);
        assert_eq!(tenor_from_ordinal(8), None);
        assert!(is_known_tenor(12));
        assert!(!is_known_tenor(9));
    }

    #[test]
    fn rate_decimal_conversion_is_exact() {
        let rate = Rate::from_decimal(dec!(0.99)).unwrap();
        assert_eq!(rate.wad(), 990_000_000_000_000_000);
        assert_eq!(rate.to_decimal().unwrap(), dec!(0.99));
    }

    #[test]
    fn rate_decimal_truncates_past_wad_scale() {
        let rate = Rate::from_decimal(dec!(0.1234567890123456789)).unwrap();
        assert_eq!(rate.wad(), 123_456_789_012_345_678);
    }

    #[test]
    fn negative_rate_rejected() {
        assert!(Rate::from_decimal(dec!(-0.01)).is_err());
    }

    #[test]
    fn amount_decimal_conversion() {
        let amount = Amount::from_decimal(dec!(1000.5), 6).unwrap();
        assert_eq!(amount.units(), 1_000_500_000);
        assert_eq!(amount.to_decimal(6).unwrap(), dec!(1000.500000));

        let wei = Amount::from_decimal(dec!(2.5), 18).unwrap();
        assert_eq!(wei.units(), 2_500_000_000_000_000_000);
    }

    #[test]
    fn amount_whole_tokens() {
        assert_eq!(Amount::whole(1_000, 6).unwrap().units(), 1_000_000_000);
        assert_eq!(Amount::whole(3, 0).unwrap().units(), 3);
    }

    #[test]
    fn amount_whole_rejects_overflow() {
        assert_eq!(Amount::whole(1, 39), Err(MathError::ArithmeticOverflow));
        assert_eq!(Amount::whole(341, 36), Err(MathError::ArithmeticOverflow));
        assert_eq!(Amount::whole(340, 36).unwrap().units(), 340 * 10u128.pow(36));
    }

    #[test]
    fn checked_sum_reports_overflow() {
        let parts = [Amount::new(7), Amount::new(8)];
        assert_eq!(Amount::checked_sum(parts), Ok(Amount::new(15)));
        assert_eq!(Amount::checked_sum(std::iter::empty::<Amount>()), Ok(Amount::ZERO));
        assert_eq!(
            Amount::checked_sum([Amount::new(u128::MAX), Amount::new(1)]),
            Err(MathError::ArithmeticOverflow)
        );
    }

    #[test]
    fn from_days_clamps_instead_of_overflowing() {
        assert_eq!(Timestamp::from_days(u64::MAX), Timestamp(u64::MAX));
        assert_eq!(Timestamp::from_days(2).as_secs(), 2 * SECONDS_PER_DAY);
    }

    #[test]
    fn amount_ratio_and_rate_multiply() {
        let half = Amount::new(500).ratio_to(Amount::new(1000)).unwrap();
        assert_eq!(half, Rate::from_decimal(dec!(0.5)).unwrap());
        assert_eq!(Amount::new(301).mul_rate(half).unwrap(), Amount::new(150)); // toward zero
    }

    #[test]
    fn timestamp_arithmetic() {
        let start = Timestamp::from_days(1);
        let later = start.plus_secs(SECONDS_PER_DAY);
        assert_eq!(start.secs_until(later), SECONDS_PER_DAY);
        assert_eq!(later.secs_until(start), 0);
        assert!(start.has_passed(later));
        assert!(!later.has_passed(start));
    }
}
