// 9.x: collateral view over the wrapper's pooled rate.
//
// revenue hiding: consumers read hwm * margin, never the raw rate, so small
// dips below the high-water mark are absorbed. a dip past the margin is a hard
// default. the peg oracle drives the soft default (IFFY) path, and an IFFY that
// lasts longer than the configured delay hardens into DISABLED.
//
// refresh ordering:
//   1. DISABLED short-circuits, it is terminal
//   2. an IFFY older than the delay -> DISABLED at iffy_since + delay, whatever the peg says
//   3. actual < hwm * margin -> DISABLED (compared against the previous hwm)
//   4. peg read: out of range or degraded feed -> IFFY, in range -> SOUND
//   5. hwm = max(hwm, actual)

use crate::config::{CollateralConfig, ConfigError};
use crate::fixed_point::MathError;
use crate::oracle::{OracleError, PegOracle};
use crate::types::{Rate, Timestamp};
use crate::wrapper::WrapperError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Anything that can report the realized value per unit of principal.
pub trait RateSource {
    fn actual_ref_per_tok(&self) -> Result<Rate, WrapperError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollateralStatus {
    Sound,
    Iffy,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollateralError {
    #[error("Oracle error: {0}")]
    Oracle(OracleError),

    #[error("Rate source error: {0}")]
    Rate(#[from] WrapperError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

// 9.0: high-water mark and the margin under it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueHidingTracker {
    high_water_mark: Rate,
    margin_ratio: Rate,
}

impl RevenueHidingTracker {
    pub fn new(margin_ratio: Rate) -> Self {
        Self {
            high_water_mark: Rate::ZERO,
            margin_ratio,
        }
    }

    pub fn high_water_mark(&self) -> Rate {
        self.high_water_mark
    }

    pub fn margin_ratio(&self) -> Rate {
        self.margin_ratio
    }

    /// hwm * margin, rounded toward zero
    pub fn disclosed(&self) -> Result<Rate, MathError> {
        self.high_water_mark.mul(self.margin_ratio)
    }

    pub fn is_below_floor(&self, actual: Rate) -> Result<bool, MathError> {
        Ok(actual < self.disclosed()?)
    }

    /// Raises the mark, never lowers it.
    pub fn observe(&mut self, actual: Rate) {
        self.high_water_mark = self.high_water_mark.max(actual);
    }
}

/// Result of one peg oracle read, reduced to what the status machine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PegCheck {
    InRange,
    OutOfRange,
    /// stale or empty feed
    Degraded,
}

// 9.1: everything refresh threads from one call to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRateState {
    pub tracker: RevenueHidingTracker,
    pub status: CollateralStatus,
    pub iffy_since: Option<Timestamp>,
    pub disabled_at: Option<Timestamp>,
}

impl CollateralRateState {
    pub fn new(margin_ratio: Rate) -> Self {
        Self {
            tracker: RevenueHidingTracker::new(margin_ratio),
            status: CollateralStatus::Sound,
            iffy_since: None,
            disabled_at: None,
        }
    }

    /// When the current soft default hardens. `None` unless IFFY.
    pub fn default_due(&self, delay_secs: u64) -> Option<Timestamp> {
        self.iffy_since.map(|since| since.plus_secs(delay_secs))
    }

    /// Status as of `now`, counting an IFFY whose delay ran out as DISABLED
    /// even before the next transition records it.
    pub fn status_at(&self, delay_secs: u64, now: Timestamp) -> CollateralStatus {
        match self.default_due(delay_secs) {
            Some(due) if due.has_passed(now) => CollateralStatus::Disabled,
            _ => self.status,
        }
    }

    /// Pure transition. `peg` is `None` when the oracle was not consulted
    /// because the actual rate already broke the floor.
    pub fn step(&self, actual: Rate, peg: Option<PegCheck>, delay_secs: u64, now: Timestamp) -> Self {
        let mut next = *self;
        if self.status == CollateralStatus::Disabled {
            return next;
        }

        // an elapsed soft default is final even if the peg has since recovered
        let hardened = self.default_due(delay_secs).filter(|due| due.has_passed(now));
        match (hardened, peg) {
            (Some(due), _) => next.disable(due),
            (None, None) => next.disable(now),
            (None, Some(PegCheck::InRange)) => {
                next.status = CollateralStatus::Sound;
                next.iffy_since = None;
            }
            (None, Some(PegCheck::OutOfRange | PegCheck::Degraded)) => {
                next.status = CollateralStatus::Iffy;
                next.iffy_since = Some(self.iffy_since.unwrap_or(now));
            }
        }

        next.tracker.observe(actual);
        next
    }

    fn disable(&mut self, now: Timestamp) {
        self.status = CollateralStatus::Disabled;
        self.iffy_since = None;
        self.disabled_at = Some(now);
    }
}

// 9.2: the collateral instance
#[derive(Debug, Clone)]
pub struct FixedTermCollateral<O: PegOracle> {
    oracle: O,
    state: CollateralRateState,
    peg: Rate,
    default_threshold: Rate,
    oracle_timeout_secs: u64,
    delay_until_default_secs: u64,
}

impl<O: PegOracle> FixedTermCollateral<O> {
    pub fn new(config: &CollateralConfig, oracle: O) -> Result<Self, ConfigError> {
        config.validate()?;
        let margin_ratio = config.margin_ratio()?;
        let peg = Rate::from_decimal(config.peg).map_err(|_| ConfigError::invalid("peg out of range"))?;
        let default_threshold = Rate::from_decimal(config.default_threshold)
            .map_err(|_| ConfigError::invalid("default threshold out of range"))?;

        Ok(Self {
            oracle,
            state: CollateralRateState::new(margin_ratio),
            peg,
            default_threshold,
            oracle_timeout_secs: config.oracle_timeout_secs,
            delay_until_default_secs: config.delay_until_default_secs,
        })
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn state(&self) -> &CollateralRateState {
        &self.state
    }

    /// Current status. An IFFY past its delay already reads DISABLED here.
    pub fn status(&self, now: Timestamp) -> CollateralStatus {
        self.state.status_at(self.delay_until_default_secs, now)
    }

    pub fn high_water_mark(&self) -> Rate {
        self.state.tracker.high_water_mark()
    }

    /// The disclosed rate external consumers should use.
    pub fn ref_per_tok(&self) -> Result<Rate, CollateralError> {
        Ok(self.state.tracker.disclosed()?)
    }

    pub fn actual_ref_per_tok(&self, source: &impl RateSource) -> Result<Rate, CollateralError> {
        Ok(source.actual_ref_per_tok()?)
    }

    /// `[peg * (1 - threshold), peg * (1 + threshold)]`
    pub fn peg_range(&self) -> Result<(Rate, Rate), CollateralError> {
        let low = self.peg.mul(Rate::ONE.checked_sub(self.default_threshold)?)?;
        let high = self.peg.mul(Rate::ONE.checked_add(self.default_threshold)?)?;
        Ok((low, high))
    }

    /// When a soft default hardens if nothing changes, or when the hard default happened.
    /// `None` while SOUND.
    pub fn when_default(&self) -> Option<Timestamp> {
        match self.state.status {
            CollateralStatus::Sound => None,
            CollateralStatus::Iffy => self.state.default_due(self.delay_until_default_secs),
            CollateralStatus::Disabled => self.state.disabled_at,
        }
    }

    /// Peg price times the actual rate. Oracle failures are returned, not absorbed.
    pub fn strict_price(&self, source: &impl RateSource, now: Timestamp) -> Result<Rate, CollateralError> {
        let price = self
            .oracle
            .price(self.oracle_timeout_secs, now)
            .map_err(CollateralError::Oracle)?;
        let actual = source.actual_ref_per_tok()?;
        Ok(price.mul(actual)?)
    }

    /// Never fails on a degraded feed. Fails only when the rate source or the
    /// oracle setup is broken, and then leaves the state untouched.
    pub fn refresh(&mut self, source: &impl RateSource, now: Timestamp) -> Result<CollateralStatus, CollateralError> {
        if self.state.status == CollateralStatus::Disabled {
            return Ok(CollateralStatus::Disabled);
        }

        let actual = source.actual_ref_per_tok()?;
        let disclosed = self.state.tracker.disclosed()?;
        let peg = if actual < disclosed {
            warn!(%actual, %disclosed, "actual rate below disclosed rate, hard default");
            None
        } else {
            Some(self.check_peg(now)?)
        };

        let next = self.state.step(actual, peg, self.delay_until_default_secs, now);
        if next.status != self.state.status {
            if next.status == CollateralStatus::Disabled {
                warn!(from = ?self.state.status, at = %now, "collateral disabled");
            } else {
                info!(from = ?self.state.status, to = ?next.status, "collateral status changed");
            }
        }
        debug!(
            %actual,
            high_water_mark = %next.tracker.high_water_mark(),
            status = ?next.status,
            "refresh"
        );

        self.state = next;
        Ok(next.status)
    }

    fn check_peg(&self, now: Timestamp) -> Result<PegCheck, CollateralError> {
        match self.oracle.price(self.oracle_timeout_secs, now) {
            Ok(price) => {
                let (low, high) = self.peg_range()?;
                if price < low || price > high {
                    warn!(%price, %low, %high, "peg out of range");
                    Ok(PegCheck::OutOfRange)
                } else {
                    Ok(PegCheck::InRange)
                }
            }
            Err(err) if err.is_degraded_feed() => {
                warn!(error = %err, "peg oracle degraded");
                Ok(PegCheck::Degraded)
            }
            Err(err) => Err(CollateralError::Oracle(err)),
        }
    }
}
