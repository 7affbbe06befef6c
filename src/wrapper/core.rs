// 7.0 wrapper/core.rs: main wrapper. holds the ledger, the venue handle and the event log.

use super::results::WrapperError;
use crate::config::{ConfigError, WrapperConfig};
use crate::events::{Event, EventId, EventPayload};
use crate::fee::EntryFeeModel;
use crate::ledger::PositionLedger;
use crate::market::{Market, MarketCatalog};
use crate::position::Position;
use crate::types::{AccountId, Amount, Timestamp};
use crate::venue::Venue;
use tracing::trace;

/** 7.1: main wrapper struct. all state lives here */
#[derive(Debug)]
pub struct FixedTermWrapper<V: Venue> {
    pub(super) config: WrapperConfig,
    pub(super) catalog: MarketCatalog,
    pub(super) fees: EntryFeeModel,
    pub(super) ledger: PositionLedger,
    pub(super) venue: V,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl<V: Venue> FixedTermWrapper<V> {
    pub fn new(config: WrapperConfig, venue: V) -> Result<Self, ConfigError> {
        config.validate()?;
        let fees = config.fee_model()?;
        Ok(Self {
            catalog: MarketCatalog::new(config.currency_id),
            fees,
            config,
            ledger: PositionLedger::new(),
            venue,
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_secs(0),
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn fee_model(&self) -> &EntryFeeModel {
        &self.fees
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn decimals(&self) -> u32 {
        self.config.underlying_decimals
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn position(&self, account: AccountId, maturity: Timestamp) -> Option<Position> {
        self.ledger.position(account, maturity).copied()
    }

    /// Markets the venue currently lists for the wrapped currency.
    pub fn active_markets(&self) -> Result<Vec<Market>, WrapperError> {
        Ok(self.catalog.active_markets(&self.venue, self.current_time)?)
    }

    /// Principal basis across all of `account`'s positions.
    pub fn deposited_by(&self, account: AccountId) -> Result<Amount, WrapperError> {
        let positions = self.ledger.positions_of(account);
        Ok(Amount::checked_sum(positions.iter().map(|p| p.deposited_amount))?)
    }

    /// Maturities `account` holds, in the order they were opened.
    pub fn active_markets_of(&self, account: AccountId) -> Vec<Timestamp> {
        self.ledger.maturities_of(account)
    }

    pub fn has_matured(&self, account: AccountId) -> bool {
        self.ledger
            .positions_of(account)
            .iter()
            .any(|p| p.has_matured(self.current_time))
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Runs `op` against the wrapper; on error both the ledger and the venue
    /// are put back exactly as they were, so a venue call failing after
    /// earlier writes went through leaves nothing half applied.
    pub(super) fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, WrapperError>,
    ) -> Result<T, WrapperError> {
        let ledger = self.ledger.clone();
        let venue = self.venue.checkpoint();
        let result = op(self);
        if result.is_err() {
            self.ledger = ledger;
            self.venue.rollback(venue);
        }
        result
    }

    pub(super) fn emit_events(&mut self, payloads: Vec<EventPayload>) {
        for payload in payloads {
            self.emit_event(payload);
        }
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        trace!(id = event.id.0, payload = ?event.payload, "event");

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
