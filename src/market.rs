//! Market catalog.
//!
//! Markets are venue-sourced snapshots: fetched for one operation, never stored.
//! The catalog picks the best one to lend into, or the one at a given maturity.

use crate::types::{tenor_from_ordinal, CurrencyId, Rate, Timestamp};
use crate::venue::{Venue, VenueError, VenueMarket};
use serde::{Deserialize, Serialize};

/// A live fixed-term market with its tenor resolved from the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub maturity: Timestamp,
    pub tenor_months: u16,
    /// Annualized lending rate quoted by the venue
    pub oracle_rate: Rate,
}

impl Market {
    pub fn from_venue(raw: &VenueMarket) -> Result<Self, MarketError> {
        let tenor_months = tenor_from_ordinal(raw.ordinal).ok_or(MarketError::UnknownTenor(raw.ordinal))?;
        Ok(Self {
            maturity: raw.maturity,
            tenor_months,
            oracle_rate: raw.oracle_rate,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MarketCatalog {
    currency: CurrencyId,
}

impl MarketCatalog {
    pub fn new(currency: CurrencyId) -> Self {
        Self { currency }
    }

    pub fn currency(&self) -> CurrencyId {
        self.currency
    }

    /// All active markets, tenors resolved.
    pub fn active_markets<V: Venue>(&self, venue: &V, now: Timestamp) -> Result<Vec<Market>, MarketError> {
        venue
            .active_markets(self.currency, now)?
            .iter()
            .map(Market::from_venue)
            .collect()
    }

    /// Highest quoted rate wins. on a tie the earlier listed market is kept.
    pub fn best_market<V: Venue>(&self, venue: &V, now: Timestamp) -> Result<Market, MarketError> {
        let markets = self.active_markets(venue, now)?;
        let mut best: Option<Market> = None;
        for market in markets {
            match best {
                Some(current) if market.oracle_rate <= current.oracle_rate => {}
                _ => best = Some(market),
            }
        }
        best.ok_or(MarketError::NoMarketsAvailable)
    }

    pub fn market_by_maturity<V: Venue>(
        &self,
        venue: &V,
        maturity: Timestamp,
        now: Timestamp,
    ) -> Result<Market, MarketError> {
        self.active_markets(venue, now)?
            .into_iter()
            .find(|m| m.maturity == maturity)
            .ok_or(MarketError::MarketNotFound(maturity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketError {
    #[error("Venue reports no active markets")]
    NoMarketsAvailable,

    #[error("No active market matures at {0}")]
    MarketNotFound(Timestamp),

    #[error("Market ordinal {0} is not on the tenor ladder")]
    UnknownTenor(u8),

    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),
}
