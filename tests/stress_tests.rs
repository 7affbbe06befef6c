//! Stress tests
//!
//! These tests walk the wrapper and its collateral through full lifecycles
//! and the edge cases that must fail cleanly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::Cell;
use term_collateral::*;

const CUSTODY: AccountId = AccountId(0);
const ALICE: AccountId = AccountId(1);
const BOB: AccountId = AccountId(2);

fn rate(d: Decimal) -> Rate {
    Rate::from_decimal(d).unwrap()
}

fn usdc(tokens: u64) -> Amount {
    Amount::whole(tokens, 6).unwrap()
}

fn day(n: u64) -> Timestamp {
    Timestamp::from_days(n)
}

fn venue() -> MockVenue {
    let mut venue = MockVenue::new(CurrencyId(3))
        .with_market(1, day(90), rate(dec!(0.04)))
        .with_market(2, day(180), rate(dec!(0.03)));
    venue.fund(ALICE, usdc(100_000));
    venue.fund(BOB, usdc(100_000));
    venue
}

/// Deposit, withdraw and matured-position scenarios.
mod lifecycle_tests {
    use super::*;

    #[test]
    fn immediate_withdraw_returns_deposit_less_fee() {
        let venue = venue().with_lend_fee(EntryFeeModel::default());
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue).unwrap();

        let deposit = w.deposit(ALICE, usdc(1_000)).unwrap();
        assert_eq!(deposit.tenor_months, 3);
        let balance = w.balance_of(ALICE);
        let result = w.withdraw(ALICE, balance).unwrap();

        // 1000 * (1 - 0.003) <= proceeds < 1000
        assert!(result.proceeds >= usdc(997));
        assert!(result.proceeds < usdc(1_000));
        assert_eq!(result.pct, Rate::ONE);
        assert_eq!(result.positions_closed, 1);
        assert!(w.active_markets_of(ALICE).is_empty());
        assert!(w.total_supply().is_zero());
    }

    #[test]
    fn matured_flag_follows_reinvest() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        w.deposit(ALICE, usdc(1_000)).unwrap();
        assert!(!w.has_matured(ALICE));

        w.set_time(day(91));
        assert!(w.has_matured(ALICE));
        w.reinvest(ALICE).unwrap();
        assert!(!w.has_matured(ALICE));
        assert_eq!(w.active_markets_of(ALICE), vec![day(180)]);
    }

    #[test]
    fn holding_to_maturity_pays_face() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        let deposit = w.deposit(ALICE, usdc(1_000)).unwrap();

        w.set_time(day(90));
        let balance = w.balance_of(ALICE);
        let result = w.withdraw(ALICE, balance).unwrap();
        assert_eq!(result.proceeds, deposit.claims);
        assert_eq!(w.venue().underlying_balance(ALICE), usdc(100_000).checked_sub(usdc(1_000)).unwrap().checked_add(deposit.claims).unwrap());
    }

    #[test]
    fn partial_withdraw_spans_every_maturity() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        w.deposit_to(ALICE, usdc(3_000), day(90)).unwrap();
        w.deposit_to(ALICE, usdc(1_000), day(180)).unwrap();
        let before: Vec<Position> = w.ledger().positions_of(ALICE);

        let quarter = Amount::new(w.balance_of(ALICE).units() / 4);
        let result = w.withdraw(ALICE, quarter).unwrap();
        assert_eq!(result.positions_closed, 0);

        for old in &before {
            let now = w.position(ALICE, old.maturity).unwrap();
            let removed = old.lent_amount.checked_sub(now.lent_amount).unwrap();
            let expected = old.lent_amount.units() / 4;
            assert!(removed.units().abs_diff(expected) <= 2);
        }
    }

    #[test]
    fn many_accounts_full_cycle() {
        let mut venue = MockVenue::new(CurrencyId(3))
            .with_market(1, day(90), rate(dec!(0.04)))
            .with_market(2, day(180), rate(dec!(0.03)));
        venue.queue_market(3, day(270), rate(dec!(0.05)));
        let accounts: Vec<AccountId> = (1..=10).map(AccountId).collect();
        for account in &accounts {
            venue.fund(*account, usdc(10_000));
        }

        let mut config = WrapperConfig::default();
        config.annual_fee = Decimal::ZERO;
        let mut w = FixedTermWrapper::new(config, venue).unwrap();

        let mut funded = Amount::ZERO;
        for (i, account) in accounts.iter().enumerate() {
            let amount = usdc(1_000 + 100 * i as u64);
            let maturity = if i % 2 == 0 { day(90) } else { day(180) };
            w.deposit_to(*account, amount, maturity).unwrap();
            funded = funded.checked_add(amount).unwrap();
        }

        // pass units around the ring
        for window in accounts.windows(2) {
            let amount = Amount::new(w.balance_of(window[0]).units() / 3);
            w.transfer(window[0], window[1], amount).unwrap();
        }

        w.set_time(day(90));
        for account in &accounts {
            w.reinvest(*account).unwrap();
            assert!(!w.has_matured(*account));
        }

        w.set_time(day(270));
        let mut returned = Amount::ZERO;
        for account in &accounts {
            let balance = w.balance_of(*account);
            if balance.is_zero() {
                continue;
            }
            returned = returned.checked_add(w.withdraw(*account, balance).unwrap().proceeds).unwrap();
        }

        assert!(w.total_supply().is_zero());
        assert!(returned > funded);
        for maturity in [day(90), day(180), day(270)] {
            assert!(w.venue().claims_of(CUSTODY, maturity).is_zero());
        }
    }
}

/// Operations that must fail without touching state.
mod rejection_tests {
    use super::*;

    #[test]
    fn zero_amounts_rejected() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        assert_eq!(w.deposit(ALICE, Amount::ZERO), Err(WrapperError::EmptyAmount));
        assert_eq!(w.withdraw(ALICE, Amount::ZERO), Err(WrapperError::EmptyAmount));
    }

    #[test]
    fn over_withdraw_rejected() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        w.deposit(ALICE, usdc(100)).unwrap();
        let balance = w.balance_of(ALICE);
        let positions = w.ledger().positions_of(ALICE);

        let result = w.withdraw(ALICE, Amount::new(balance.units() + 1));
        assert_eq!(
            result,
            Err(WrapperError::InsufficientBalance {
                requested: Amount::new(balance.units() + 1),
                available: balance,
            })
        );
        assert_eq!(w.ledger().positions_of(ALICE), positions);
    }

    #[test]
    fn no_markets_available() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        w.venue_mut().delist_all();
        assert_eq!(
            w.deposit(ALICE, usdc(100)),
            Err(WrapperError::Market(MarketError::NoMarketsAvailable))
        );
    }

    #[test]
    fn unknown_maturity_rejected() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        assert_eq!(
            w.deposit_to(ALICE, usdc(100), day(45)),
            Err(WrapperError::Market(MarketError::MarketNotFound(day(45))))
        );
        assert!(w.total_supply().is_zero());
    }

    #[test]
    fn missing_venue_address_rejected() {
        let mut config = WrapperConfig::default();
        config.venue_address = String::new();
        assert!(matches!(
            FixedTermWrapper::new(config, venue()),
            Err(ConfigError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn bad_margin_rejected() {
        let oracle = MockPegOracle::new(Rate::ONE, Timestamp::from_secs(0));
        let mut config = CollateralConfig::default();
        config.allowed_drop = dec!(1);
        assert!(FixedTermCollateral::new(&config, oracle).is_err());
    }
}

/// Collateral status scenarios, against a scripted rate and against the wrapper.
mod collateral_tests {
    use super::*;

    struct Scripted(Cell<Rate>);

    impl RateSource for Scripted {
        fn actual_ref_per_tok(&self) -> Result<Rate, WrapperError> {
            Ok(self.0.get())
        }
    }

    fn collateral() -> FixedTermCollateral<MockPegOracle> {
        let oracle = MockPegOracle::new(Rate::ONE, Timestamp::from_secs(0));
        FixedTermCollateral::new(&CollateralConfig::default(), oracle).unwrap()
    }

    #[test]
    fn two_percent_drop_under_one_percent_margin_defaults() {
        let mut c = collateral();
        let source = Scripted(Cell::new(rate(dec!(1.00))));
        let now = Timestamp::from_secs(60);

        assert_eq!(c.refresh(&source, now).unwrap(), CollateralStatus::Sound);
        assert_eq!(c.refresh(&source, now).unwrap(), CollateralStatus::Sound);
        source.0.set(rate(dec!(0.98)));
        assert_eq!(c.refresh(&source, now).unwrap(), CollateralStatus::Disabled);
        assert_eq!(c.high_water_mark(), rate(dec!(1.00)));
    }

    #[test]
    fn broken_feed_is_iffy_until_it_recovers() {
        let mut c = collateral();
        let source = Scripted(Cell::new(rate(dec!(1.00))));
        c.oracle_mut().set_failure(MockFailure::EmptyResponse);
        assert_eq!(c.refresh(&source, Timestamp::from_secs(10)).unwrap(), CollateralStatus::Iffy);

        c.oracle_mut().set_failure(MockFailure::None);
        c.oracle_mut().set_price(rate(dec!(1.001)), Timestamp::from_secs(20));
        assert_eq!(c.refresh(&source, Timestamp::from_secs(20)).unwrap(), CollateralStatus::Sound);
    }

    #[test]
    fn venue_rate_shock_disables_wrapper_collateral() {
        let mut config = WrapperConfig::default();
        config.annual_fee = Decimal::ZERO;
        let mut w = FixedTermWrapper::new(config, venue()).unwrap();
        w.deposit_to(ALICE, usdc(1_000), day(180)).unwrap();

        let mut c = collateral();
        assert_eq!(c.refresh(&w, w.time()).unwrap(), CollateralStatus::Sound);
        assert_eq!(c.actual_ref_per_tok(&w).unwrap(), Rate::ONE);

        // accrual alone only raises the mark
        w.set_time(day(30));
        c.oracle_mut().set_price(Rate::ONE, w.time());
        assert_eq!(c.refresh(&w, w.time()).unwrap(), CollateralStatus::Sound);
        let disclosed = c.ref_per_tok().unwrap();
        assert!(disclosed > rate(dec!(0.99)));

        // repricing the market at 10% knocks present value well under the floor
        w.venue_mut().set_rate(day(180), rate(dec!(0.10)));
        assert!(c.actual_ref_per_tok(&w).unwrap() < disclosed);
        assert_eq!(c.refresh(&w, w.time()).unwrap(), CollateralStatus::Disabled);

        w.venue_mut().set_rate(day(180), rate(dec!(0.03)));
        assert_eq!(c.refresh(&w, w.time()).unwrap(), CollateralStatus::Disabled);
        assert_eq!(c.ref_per_tok().unwrap(), disclosed);
    }

    #[test]
    fn long_depeg_hardens_after_delay() {
        let mut c = collateral();
        let source = Scripted(Cell::new(rate(dec!(1.00))));
        let mut now = Timestamp::from_secs(0);

        for _ in 0..24 {
            c.oracle_mut().set_price(rate(dec!(0.90)), now);
            assert_eq!(c.refresh(&source, now).unwrap(), CollateralStatus::Iffy);
            now = now.plus_secs(3_600);
        }
        assert_eq!(c.when_default(), Some(Timestamp::from_secs(SECONDS_PER_DAY)));

        c.oracle_mut().set_price(rate(dec!(0.90)), now);
        assert_eq!(c.refresh(&source, now).unwrap(), CollateralStatus::Disabled);
        assert_eq!(c.when_default(), Some(now));
    }
}

/// Event log behaviour under load.
mod event_tests {
    use super::*;

    #[test]
    fn event_log_is_bounded() {
        let mut config = WrapperConfig::default();
        config.max_events = 5;
        let mut w = FixedTermWrapper::new(config, venue()).unwrap();

        for _ in 0..10 {
            w.deposit(ALICE, usdc(10)).unwrap();
        }
        assert_eq!(w.events().len(), 5);
        assert!(matches!(w.events().last().unwrap().payload, EventPayload::Deposit(_)));
        assert_eq!(w.recent_events(2).len(), 2);

        let ids: Vec<u64> = w.events().iter().map(|e| e.id.0).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn transfer_events_record_moves() {
        let mut w = FixedTermWrapper::new(WrapperConfig::default(), venue()).unwrap();
        w.deposit_to(ALICE, usdc(100), day(90)).unwrap();
        w.deposit_to(ALICE, usdc(100), day(180)).unwrap();

        let balance = w.balance_of(ALICE);
        w.transfer(ALICE, BOB, balance).unwrap();

        let closed = w
            .events()
            .iter()
            .filter(|e| matches!(&e.payload, EventPayload::PositionClosed(c) if c.reason == CloseReason::TransferredOut))
            .count();
        let opened_for_bob = w
            .events()
            .iter()
            .filter(|e| matches!(&e.payload, EventPayload::PositionOpened(o) if o.account_id == BOB))
            .count();
        assert_eq!(closed, 2);
        assert_eq!(opened_for_bob, 2);
    }
}
