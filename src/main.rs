//! Fixed-term wrapper simulation.
//!
//! Walks the wrapper and its collateral through deposits, withdrawals,
//! transfers, rollovers and a default against the in-memory mocks.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use term_collateral::*;
use tracing_subscriber::EnvFilter;

type SimResult = Result<(), Box<dyn std::error::Error>>;

const ALICE: AccountId = AccountId(1);
const BOB: AccountId = AccountId(2);

fn main() -> SimResult {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!(started_at = %Timestamp::now(), "term-sim starting");

    println!("Fixed-Term Wrapper Simulation");
    println!("One underlying, two markets, revenue-hiding collateral\n");

    scenario_1_deposit_and_withdraw()?;
    scenario_2_transfer_proration()?;
    scenario_3_rollover()?;
    scenario_4_revenue_hiding_and_default()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn rate(d: Decimal) -> Result<Rate, MathError> {
    Rate::from_decimal(d)
}

fn usdc(amount: Amount) -> Result<Decimal, MathError> {
    amount.to_decimal(6)
}

fn two_market_venue(lend_fee: bool) -> Result<MockVenue, MathError> {
    let mut venue = MockVenue::new(CurrencyId(3))
        .with_market(1, Timestamp::from_days(90), rate(dec!(0.04))?)
        .with_market(2, Timestamp::from_days(180), rate(dec!(0.03))?);
    if lend_fee {
        venue = venue.with_lend_fee(EntryFeeModel::default());
    }
    venue.fund(ALICE, Amount::whole(10_000, 6)?);
    venue.fund(BOB, Amount::whole(10_000, 6)?);
    Ok(venue)
}

/// Deposit into the best market, withdraw right away and at maturity.
fn scenario_1_deposit_and_withdraw() -> SimResult {
    println!("Scenario 1: Deposit and Withdraw\n");

    let mut wrapper = FixedTermWrapper::new(WrapperConfig::default(), two_market_venue(true)?)?;

    let deposit = wrapper.deposit(ALICE, Amount::whole(1_000, 6)?)?;
    println!("  Alice deposits 1,000 USDC");
    println!(
        "  Best market matures on day {}, fee {}, claims {}",
        deposit.maturity.as_secs() / SECONDS_PER_DAY,
        usdc(deposit.fee)?,
        usdc(deposit.claims)?
    );
    println!("  Alice rate: {}\n", wrapper.ref_per_tok(ALICE)?);

    let half = Amount::new(wrapper.balance_of(ALICE).units() / 2);
    let early = wrapper.withdraw(ALICE, half)?;
    println!("  Alice withdraws half immediately: {} USDC back", usdc(early.proceeds)?);

    wrapper.set_time(Timestamp::from_days(90));
    let rest = wrapper.balance_of(ALICE);
    let late = wrapper.withdraw(ALICE, rest)?;
    println!("  At maturity the other half redeems at face: {} USDC", usdc(late.proceeds)?);
    println!("  Supply left: {}\n", wrapper.total_supply());
    Ok(())
}

/// A transfer drags the same share of every position to the receiver.
fn scenario_2_transfer_proration() -> SimResult {
    println!("Scenario 2: Transfer Proration\n");

    let mut wrapper = FixedTermWrapper::new(WrapperConfig::default(), two_market_venue(false)?)?;
    wrapper.deposit_to(ALICE, Amount::whole(600, 6)?, Timestamp::from_days(90))?;
    wrapper.deposit_to(ALICE, Amount::whole(400, 6)?, Timestamp::from_days(180))?;

    let quarter = Amount::new(wrapper.balance_of(ALICE).units() / 4);
    let moved = wrapper.transfer(ALICE, BOB, quarter)?;
    println!("  Alice sends a quarter of her balance to Bob, {} positions move", moved.positions_moved);

    for account in [ALICE, BOB] {
        for position in wrapper.ledger().positions_of(account) {
            println!(
                "  account {} day {}: claims {}, principal {}",
                account.0,
                position.maturity.as_secs() / SECONDS_PER_DAY,
                usdc(position.lent_amount)?,
                usdc(position.deposited_amount)?
            );
        }
    }
    println!();
    Ok(())
}

/// A matured position rolls into the next market with its principal basis intact.
fn scenario_3_rollover() -> SimResult {
    println!("Scenario 3: Rollover\n");

    let mut venue = MockVenue::new(CurrencyId(3)).with_market(1, Timestamp::from_days(90), rate(dec!(0.04))?);
    venue.fund(ALICE, Amount::whole(1_000, 6)?);
    let mut wrapper = FixedTermWrapper::new(WrapperConfig::default(), venue)?;
    wrapper.deposit(ALICE, Amount::whole(1_000, 6)?)?;

    wrapper.venue_mut().queue_market(1, Timestamp::from_days(180), rate(dec!(0.05))?);
    wrapper.set_time(Timestamp::from_days(90));
    println!("  Day 90, matured: {}, rate {}", wrapper.has_matured(ALICE), wrapper.ref_per_tok(ALICE)?);

    for rolled in wrapper.reinvest(ALICE)? {
        println!(
            "  Rolled day {} -> day {}: proceeds {}, new claims {}",
            rolled.from_maturity.as_secs() / SECONDS_PER_DAY,
            rolled.to_maturity.as_secs() / SECONDS_PER_DAY,
            usdc(rolled.proceeds)?,
            usdc(rolled.claims)?
        );
    }
    println!("  Rate after roll: {}\n", wrapper.ref_per_tok(ALICE)?);
    Ok(())
}

/// Peg wobble is a soft default that clears; a drop in realized value is not.
fn scenario_4_revenue_hiding_and_default() -> SimResult {
    println!("Scenario 4: Revenue Hiding and Default\n");

    let deployment = Environment::Development.config();
    let mut wrapper = FixedTermWrapper::new(deployment.wrapper.clone(), two_market_venue(false)?)?;
    let oracle = MockPegOracle::new(Rate::ONE, Timestamp::from_secs(0));
    let mut collateral = FixedTermCollateral::new(&deployment.collateral, oracle)?;

    wrapper.deposit_to(ALICE, Amount::whole(1_000, 6)?, Timestamp::from_days(180))?;
    let status = collateral.refresh(&wrapper, wrapper.time())?;
    println!("  Day 0: {:?}, disclosed {}", status, collateral.ref_per_tok()?);

    wrapper.set_time(Timestamp::from_days(10));
    collateral.oracle_mut().set_price(rate(dec!(0.93))?, wrapper.time());
    let status = collateral.refresh(&wrapper, wrapper.time())?;
    println!("  Day 10, peg at 0.93: {:?}, defaults at {:?}", status, collateral.when_default());

    wrapper.set_time(Timestamp::from_days(10).plus_secs(3_600));
    collateral.oracle_mut().set_price(Rate::ONE, wrapper.time());
    let status = collateral.refresh(&wrapper, wrapper.time())?;
    println!("  An hour later, peg restored: {:?}", status);
    println!("  Strict price: {}", collateral.strict_price(&wrapper, wrapper.time())?);

    wrapper.set_time(Timestamp::from_days(30));
    wrapper.venue_mut().set_rate(Timestamp::from_days(180), rate(dec!(0.10))?);
    collateral.oracle_mut().set_price(Rate::ONE, wrapper.time());
    println!(
        "  Day 30, market rate jumps to 10%: actual {}, disclosed {}",
        collateral.actual_ref_per_tok(&wrapper)?,
        collateral.ref_per_tok()?
    );
    let status = collateral.refresh(&wrapper, wrapper.time())?;
    println!("  Refresh: {:?}", status);

    wrapper.venue_mut().set_rate(Timestamp::from_days(180), rate(dec!(0.03))?);
    let status = collateral.refresh(&wrapper, wrapper.time())?;
    println!("  Rate recovers, status stays {:?}", status);
    Ok(())
}
