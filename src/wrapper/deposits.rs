//! Deposits: lend underlying into a market and mint wrapper units 1:1 with the claims.

use super::core::FixedTermWrapper;
use super::results::{DepositResult, WrapperError};
use crate::events::{DepositEvent, EventPayload, PositionOpenedEvent};
use crate::market::Market;
use crate::types::{AccountId, Amount, Timestamp};
use crate::venue::Venue;
use tracing::{debug, info};

impl<V: Venue> FixedTermWrapper<V> {
    /// Lend `amount` into the best-paying active market.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<DepositResult, WrapperError> {
        if amount.is_zero() {
            return Err(WrapperError::EmptyAmount);
        }
        let market = self.catalog.best_market(&self.venue, self.current_time)?;
        self.lend_into(account, amount, market)
    }

    /// Lend `amount` into the active market maturing at `maturity`.
    pub fn deposit_to(
        &mut self,
        account: AccountId,
        amount: Amount,
        maturity: Timestamp,
    ) -> Result<DepositResult, WrapperError> {
        if amount.is_zero() {
            return Err(WrapperError::EmptyAmount);
        }
        let market = self
            .catalog
            .market_by_maturity(&self.venue, maturity, self.current_time)?;
        self.lend_into(account, amount, market)
    }

    fn lend_into(&mut self, account: AccountId, amount: Amount, market: Market) -> Result<DepositResult, WrapperError> {
        let now = self.current_time;
        let currency = self.catalog.currency();
        let custody = self.config.custody;

        let fee = self.fees.cost(amount, market.maturity, market.tenor_months, now)?;
        let deposited = amount.checked_sub(fee)?;
        let claims = self.venue.quote_lend(currency, market.maturity, amount, now)?;
        if claims.is_zero() {
            return Err(WrapperError::NothingLent(market.maturity));
        }

        debug!(
            account = account.0,
            maturity = %market.maturity,
            %amount,
            %fee,
            %claims,
            "lending into market"
        );

        // bookkeeping first, then the venue moves value
        let opened = self.atomically(|w| {
            let opened = w
                .ledger
                .credit(account, market.maturity, market.tenor_months, claims, deposited)?;
            w.ledger.mint(account, claims)?;

            w.venue.transfer_underlying(account, custody, amount)?;
            w.venue
                .mint_via_underlying(currency, market.maturity, amount, claims, custody, now)?;
            Ok(opened)
        })?;

        let mut events = Vec::with_capacity(2);
        if opened {
            events.push(EventPayload::PositionOpened(PositionOpenedEvent {
                account_id: account,
                maturity: market.maturity,
                tenor_months: market.tenor_months,
            }));
        }
        events.push(EventPayload::Deposit(DepositEvent {
            account_id: account,
            maturity: market.maturity,
            amount,
            fee,
            claims,
            new_balance: self.ledger.balance_of(account),
        }));
        self.emit_events(events);

        info!(account = account.0, maturity = %market.maturity, %amount, %claims, "deposit");

        Ok(DepositResult {
            maturity: market.maturity,
            tenor_months: market.tenor_months,
            fee,
            claims,
            deposited,
            opened,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::WrapperConfig;
    use crate::fee::EntryFeeModel;
    use crate::market::MarketError;
    use crate::types::{AccountId, Amount, CurrencyId, Rate, Timestamp};
    use crate::venue::MockVenue;
    use crate::wrapper::{FixedTermWrapper, WrapperError};
    use rust_decimal_macros::dec;

    const ALICE: AccountId = AccountId(1);

    fn wrapper() -> FixedTermWrapper<MockVenue> {
        let venue = MockVenue::new(CurrencyId(3))
            .with_lend_fee(EntryFeeModel::default())
            .with_market(1, Timestamp::from_days(90), Rate::from_decimal(dec!(0.04)).unwrap())
            .with_market(2, Timestamp::from_days(180), Rate::from_decimal(dec!(0.03)).unwrap());
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue).unwrap();
        w.venue_mut().fund(ALICE, Amount::whole(10_000, 6).unwrap());
        w
    }

    #[test]
    fn deposit_opens_position_in_best_market() {
        let mut w = wrapper();
        let result = w.deposit(ALICE, Amount::whole(1_000, 6).unwrap()).unwrap();

        assert!(result.opened);
        assert_eq!(result.maturity, Timestamp::from_days(90));
        assert_eq!(result.fee, Amount::new(3_000_000));
        assert_eq!(result.deposited, Amount::new(997_000_000));
        assert_eq!(result.claims, Amount::new(1_006_970_000));

        assert_eq!(w.balance_of(ALICE), result.claims);
        assert_eq!(w.total_supply(), result.claims);
        assert_eq!(w.deposited_by(ALICE).unwrap(), Amount::new(997_000_000));
        assert_eq!(w.venue().underlying_balance(ALICE), Amount::whole(9_000, 6).unwrap());
        assert_eq!(w.venue().claims_of(AccountId(0), Timestamp::from_days(90)), result.claims);
    }

    #[test]
    fn second_deposit_merges() {
        let mut w = wrapper();
        w.deposit(ALICE, Amount::whole(1_000, 6).unwrap()).unwrap();
        let second = w.deposit(ALICE, Amount::whole(1_000, 6).unwrap()).unwrap();
        assert!(!second.opened);
        assert_eq!(w.active_markets_of(ALICE), vec![Timestamp::from_days(90)]);
        assert_eq!(w.deposited_by(ALICE).unwrap(), Amount::new(1_994_000_000));
    }

    #[test]
    fn deposit_to_specific_maturity() {
        let mut w = wrapper();
        let result = w
            .deposit_to(ALICE, Amount::whole(500, 6).unwrap(), Timestamp::from_days(180))
            .unwrap();
        assert_eq!(result.tenor_months, 6);
        assert_eq!(w.active_markets_of(ALICE), vec![Timestamp::from_days(180)]);
    }

    #[test]
    fn deposit_to_unknown_maturity() {
        let mut w = wrapper();
        let result = w.deposit_to(ALICE, Amount::whole(500, 6).unwrap(), Timestamp::from_days(91));
        assert_eq!(
            result,
            Err(WrapperError::Market(MarketError::MarketNotFound(Timestamp::from_days(91))))
        );
    }

    #[test]
    fn empty_deposit_rejected() {
        let mut w = wrapper();
        assert_eq!(w.deposit(ALICE, Amount::ZERO), Err(WrapperError::EmptyAmount));
        assert_eq!(
            w.deposit_to(ALICE, Amount::ZERO, Timestamp::from_days(90)),
            Err(WrapperError::EmptyAmount)
        );
    }

    #[test]
    fn no_markets_available() {
        let mut w = wrapper();
        w.venue_mut().delist_all();
        let result = w.deposit(ALICE, Amount::whole(1, 6).unwrap());
        assert_eq!(result, Err(WrapperError::Market(MarketError::NoMarketsAvailable)));
    }

    #[test]
    fn failed_venue_write_leaves_ledger_untouched() {
        let mut w = wrapper();
        w.venue_mut().set_reject_writes(true);
        assert!(matches!(w.deposit(ALICE, Amount::whole(1_000, 6).unwrap()), Err(WrapperError::Venue(_))));
        assert!(w.balance_of(ALICE).is_zero());
        assert!(w.active_markets_of(ALICE).is_empty());
        assert!(w.events().is_empty());
    }

    #[test]
    fn deposit_without_funds_fails_atomically() {
        let mut w = wrapper();
        let bob = AccountId(2);
        assert!(w.deposit(bob, Amount::whole(1, 6).unwrap()).is_err());
        assert!(w.balance_of(bob).is_zero());
        assert!(w.total_supply().is_zero());
    }
}
