// Peg Oracle Integration
//
// The collateral only needs one question answered: what is the reference unit
// worth against its target right now, given a staleness bound. Any feed
// (Chainlink style aggregator, Pyth, a CEX median) implements `PegOracle`.

use crate::types::{Rate, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Last update is older than the caller's bound.
    #[error("oracle stale: last update {age_secs}s ago, max {max_staleness_secs}s")]
    Stale { age_secs: u64, max_staleness_secs: u64 },

    /// Feed answered with no data at all.
    #[error("oracle returned no data")]
    Unavailable,

    /// Wiring or configuration fault. Never treated as a market signal.
    #[error("oracle misconfigured: {0}")]
    Misconfigured(String),
}

impl OracleError {
    /// Failures that say something about the feed's health rather than about our setup.
    pub fn is_degraded_feed(&self) -> bool {
        matches!(self, OracleError::Stale { .. } | OracleError::Unavailable)
    }
}

pub trait PegOracle {
    fn price(&self, max_staleness_secs: u64, now: Timestamp) -> Result<Rate, OracleError>;
}

/// How the mock fails, when it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    None,
    EmptyResponse,
    Misconfigured,
}

/// Mock feed for tests and the simulator
#[derive(Debug, Clone)]
pub struct MockPegOracle {
    price: Rate,
    updated_at: Timestamp,
    failure: MockFailure,
}

impl MockPegOracle {
    pub fn new(price: Rate, updated_at: Timestamp) -> Self {
        Self {
            price,
            updated_at,
            failure: MockFailure::None,
        }
    }

    pub fn set_price(&mut self, price: Rate, updated_at: Timestamp) {
        self.price = price;
        self.updated_at = updated_at;
    }

    pub fn set_failure(&mut self, failure: MockFailure) {
        self.failure = failure;
    }
}

impl PegOracle for MockPegOracle {
    fn price(&self, max_staleness_secs: u64, now: Timestamp) -> Result<Rate, OracleError> {
        match self.failure {
            MockFailure::EmptyResponse => return Err(OracleError::Unavailable),
            MockFailure::Misconfigured => {
                return Err(OracleError::Misconfigured("feed address not set".to_string()))
            }
            MockFailure::None => {}
        }

        let age_secs = self.updated_at.secs_until(now);
        if age_secs > max_staleness_secs {
            return Err(OracleError::Stale {
                age_secs,
                max_staleness_secs,
            });
        }
        Ok(self.price)
    }
}
