//! Reinvestment: roll matured positions into the current best market.
//!
//! The principal basis carries over unchanged, so the yield earned by the
//! matured position stays visible in the new position's rate.

use super::core::FixedTermWrapper;
use super::results::{ReinvestResult, WrapperError};
use crate::events::{CloseReason, EventPayload, PositionClosedEvent, PositionOpenedEvent, ReinvestedEvent};
use crate::position::Position;
use crate::types::AccountId;
use crate::venue::Venue;
use tracing::{debug, info};

impl<V: Venue> FixedTermWrapper<V> {
    /// Rolls every matured position of `account`. Returns an empty list when nothing matured.
    pub fn reinvest(&mut self, account: AccountId) -> Result<Vec<ReinvestResult>, WrapperError> {
        let now = self.current_time;
        let matured: Vec<Position> = self
            .ledger
            .positions_of(account)
            .into_iter()
            .filter(|p| p.has_matured(now))
            .collect();

        if matured.is_empty() {
            debug!(account = account.0, "nothing matured");
            return Ok(Vec::new());
        }

        let currency = self.catalog.currency();
        let custody = self.config.custody;

        let (results, events) = self.atomically(|w| {
            w.venue.initialize_markets(currency, now)?;
            let target = w.catalog.best_market(&w.venue, now)?;

            let mut results = Vec::with_capacity(matured.len());
            let mut events = Vec::new();

            for old in &matured {
                let proceeds = w
                    .venue
                    .present_value(currency, old.maturity, old.lent_amount, now)?;
                let claims = w.venue.quote_lend(currency, target.maturity, proceeds, now)?;
                if claims.is_zero() {
                    return Err(WrapperError::NothingLent(target.maturity));
                }

                // swap the position first, then settle with the venue
                w.ledger.remove_position(account, old.maturity);
                let opened = w.ledger.credit(
                    account,
                    target.maturity,
                    target.tenor_months,
                    claims,
                    old.deposited_amount,
                )?;
                if claims >= old.lent_amount {
                    w.ledger.mint(account, claims.checked_sub(old.lent_amount)?)?;
                } else {
                    w.ledger.burn(account, old.lent_amount.checked_sub(claims)?)?;
                }

                w.venue
                    .redeem_to_underlying(currency, old.maturity, old.lent_amount, custody, custody, now)?;
                w.venue
                    .mint_via_underlying(currency, target.maturity, proceeds, claims, custody, now)?;

                debug!(
                    account = account.0,
                    from = %old.maturity,
                    to = %target.maturity,
                    %proceeds,
                    %claims,
                    "rolled position"
                );

                events.push(EventPayload::PositionClosed(PositionClosedEvent {
                    account_id: account,
                    maturity: old.maturity,
                    reason: CloseReason::Matured,
                }));
                if opened {
                    events.push(EventPayload::PositionOpened(PositionOpenedEvent {
                        account_id: account,
                        maturity: target.maturity,
                        tenor_months: target.tenor_months,
                    }));
                }
                events.push(EventPayload::Reinvested(ReinvestedEvent {
                    account_id: account,
                    from_maturity: old.maturity,
                    to_maturity: target.maturity,
                    proceeds,
                    claims,
                }));
                results.push(ReinvestResult {
                    from_maturity: old.maturity,
                    to_maturity: target.maturity,
                    proceeds,
                    claims,
                });
            }
            Ok((results, events))
        })?;
        self.emit_events(events);

        info!(account = account.0, rolled = results.len(), "reinvest");
        Ok(results)
    }
}
