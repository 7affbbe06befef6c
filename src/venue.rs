// Fixed-Term Venue Integration
//
// The wrapper never prices a fixed-term claim itself. It asks the venue for the
// list of live markets, for lend quotes and for present values, and it moves
// underlying and claims through the same handle. Any venue (on chain adapter,
// simulator, replay) implements `Venue`; `MockVenue` is the deterministic one
// used by tests and the simulation binary.

use crate::fee::EntryFeeModel;
use crate::fixed_point::{self, MathError, WAD};
use crate::types::{tenor_from_ordinal, AccountId, Amount, CurrencyId, Rate, Timestamp, SECONDS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A market as the venue reports it. `ordinal` is the position on the tenor ladder (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueMarket {
    pub maturity: Timestamp,
    pub ordinal: u8,
    /// annualized lending rate
    pub oracle_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VenueError {
    #[error("currency {0:?} is not listed on the venue")]
    UnknownCurrency(CurrencyId),

    #[error("no active market matures at {0}")]
    MarketNotActive(Timestamp),

    #[error("insufficient underlying for {account:?}: requested {requested}, available {available}")]
    InsufficientUnderlying {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("insufficient claims at maturity {maturity}: requested {requested}, available {available}")]
    InsufficientClaims {
        maturity: Timestamp,
        requested: Amount,
        available: Amount,
    },

    #[error("venue rejected the call: {0}")]
    Rejected(String),

    #[error("venue math: {0}")]
    Math(#[from] MathError),
}

/// Capability the ledger consumes. Reads take `&self`; anything that moves
/// value takes `&mut self`, so a venue call can never re-enter the wrapper
/// that owns the handle.
pub trait Venue {
    /// Snapshot of the venue-side state a wrapper operation can touch.
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    /// Puts every write made since `checkpoint` back.
    fn rollback(&mut self, checkpoint: Self::Checkpoint);

    fn active_markets(&self, currency: CurrencyId, now: Timestamp) -> Result<Vec<VenueMarket>, VenueError>;

    /// Claim units receivable for lending `amount` of underlying into `maturity`.
    fn quote_lend(
        &self,
        currency: CurrencyId,
        maturity: Timestamp,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, VenueError>;

    /// Underlying value of `claims` at `maturity`; face value once matured.
    fn present_value(
        &self,
        currency: CurrencyId,
        maturity: Timestamp,
        claims: Amount,
        now: Timestamp,
    ) -> Result<Amount, VenueError>;

    /// Settles matured markets and lists the next ones.
    fn initialize_markets(&mut self, currency: CurrencyId, now: Timestamp) -> Result<(), VenueError>;

    fn transfer_underlying(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), VenueError>;

    /// Lends `amount` of `holder`'s underlying and credits `claims` to `holder`.
    fn mint_via_underlying(
        &mut self,
        currency: CurrencyId,
        maturity: Timestamp,
        amount: Amount,
        claims: Amount,
        holder: AccountId,
        now: Timestamp,
    ) -> Result<(), VenueError>;

    /// Burns `claims` held by `holder` and pays the proceeds to `recipient`.
    fn redeem_to_underlying(
        &mut self,
        currency: CurrencyId,
        maturity: Timestamp,
        claims: Amount,
        holder: AccountId,
        recipient: AccountId,
        now: Timestamp,
    ) -> Result<Amount, VenueError>;
}

/// Simple interest venue on a 360 day year. Deterministic, in-memory.
#[derive(Debug, Clone)]
pub struct MockVenue {
    currency: CurrencyId,
    markets: Vec<VenueMarket>,
    // listed by the next initialize_markets
    queued: Vec<VenueMarket>,
    lend_fee: Option<EntryFeeModel>,
    underlying: HashMap<AccountId, Amount>,
    claims: HashMap<(AccountId, Timestamp), Amount>,
    initializations: u32,
    reject_writes: bool,
    // writes left before the venue starts rejecting
    write_budget: Option<u32>,
}

/// Everything `MockVenue` mutates on a write. The failure knobs are not part of it.
#[derive(Debug, Clone)]
pub struct MockCheckpoint {
    markets: Vec<VenueMarket>,
    queued: Vec<VenueMarket>,
    underlying: HashMap<AccountId, Amount>,
    claims: HashMap<(AccountId, Timestamp), Amount>,
    initializations: u32,
}

impl MockVenue {
    pub fn new(currency: CurrencyId) -> Self {
        Self {
            currency,
            markets: Vec::new(),
            queued: Vec::new(),
            lend_fee: None,
            underlying: HashMap::new(),
            claims: HashMap::new(),
            initializations: 0,
            reject_writes: false,
            write_budget: None,
        }
    }

    /// Charge this entry fee on every lend, like a real venue's liquidity fee.
    pub fn with_lend_fee(mut self, fee: EntryFeeModel) -> Self {
        self.lend_fee = Some(fee);
        self
    }

    pub fn with_market(mut self, ordinal: u8, maturity: Timestamp, oracle_rate: Rate) -> Self {
        self.list_market(ordinal, maturity, oracle_rate);
        self
    }

    pub fn list_market(&mut self, ordinal: u8, maturity: Timestamp, oracle_rate: Rate) {
        self.markets.retain(|m| m.maturity != maturity);
        self.markets.push(VenueMarket {
            maturity,
            ordinal,
            oracle_rate,
        });
    }

    pub fn queue_market(&mut self, ordinal: u8, maturity: Timestamp, oracle_rate: Rate) {
        self.queued.push(VenueMarket {
            maturity,
            ordinal,
            oracle_rate,
        });
    }

    pub fn set_rate(&mut self, maturity: Timestamp, oracle_rate: Rate) {
        if let Some(market) = self.markets.iter_mut().find(|m| m.maturity == maturity) {
            market.oracle_rate = oracle_rate;
        }
    }

    pub fn delist_all(&mut self) {
        self.markets.clear();
    }

    pub fn fund(&mut self, account: AccountId, amount: Amount) {
        let balance = self.underlying.entry(account).or_default();
        *balance = Amount(balance.units().saturating_add(amount.units()));
    }

    pub fn underlying_balance(&self, account: AccountId) -> Amount {
        self.underlying.get(&account).copied().unwrap_or_default()
    }

    pub fn claims_of(&self, holder: AccountId, maturity: Timestamp) -> Amount {
        self.claims.get(&(holder, maturity)).copied().unwrap_or_default()
    }

    pub fn initializations(&self) -> u32 {
        self.initializations
    }

    /// Makes every value-moving call fail, for atomicity tests.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    fn check_currency(&self, currency: CurrencyId) -> Result<(), VenueError> {
        if currency == self.currency {
            Ok(())
        } else {
            Err(VenueError::UnknownCurrency(currency))
        }
    }

    /// Accept `writes` more value-moving calls, then reject the rest. `None` lifts the limit.
    pub fn set_write_budget(&mut self, writes: Option<u32>) {
        self.write_budget = writes;
    }

    fn check_writable(&mut self) -> Result<(), VenueError> {
        if self.reject_writes {
            return Err(VenueError::Rejected("writes disabled".to_string()));
        }
        match self.write_budget.as_mut() {
            Some(0) => Err(VenueError::Rejected("write budget exhausted".to_string())),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn live_market(&self, maturity: Timestamp, now: Timestamp) -> Result<&VenueMarket, VenueError> {
        self.markets
            .iter()
            .find(|m| m.maturity == maturity && !maturity.has_passed(now))
            .ok_or(VenueError::MarketNotActive(maturity))
    }

    // 1 + rate * t / year
    fn growth_factor(oracle_rate: Rate, maturity: Timestamp, now: Timestamp) -> Result<u128, MathError> {
        let accrued = fixed_point::mul_div(
            oracle_rate.wad(),
            u128::from(now.secs_until(maturity)),
            u128::from(SECONDS_PER_YEAR),
        )?;
        WAD.checked_add(accrued).ok_or(MathError::ArithmeticOverflow)
    }

    fn debit_underlying(&mut self, account: AccountId, amount: Amount) -> Result<(), VenueError> {
        let available = self.underlying_balance(account);
        if available < amount {
            return Err(VenueError::InsufficientUnderlying {
                account,
                requested: amount,
                available,
            });
        }
        self.underlying.insert(account, available.checked_sub(amount)?);
        Ok(())
    }
}

impl Venue for MockVenue {
    type Checkpoint = MockCheckpoint;

    fn checkpoint(&self) -> MockCheckpoint {
        MockCheckpoint {
            markets: self.markets.clone(),
            queued: self.queued.clone(),
            underlying: self.underlying.clone(),
            claims: self.claims.clone(),
            initializations: self.initializations,
        }
    }

    fn rollback(&mut self, checkpoint: MockCheckpoint) {
        self.markets = checkpoint.markets;
        self.queued = checkpoint.queued;
        self.underlying = checkpoint.underlying;
        self.claims = checkpoint.claims;
        self.initializations = checkpoint.initializations;
    }

    fn active_markets(&self, currency: CurrencyId, now: Timestamp) -> Result<Vec<VenueMarket>, VenueError> {
        self.check_currency(currency)?;
        Ok(self
            .markets
            .iter()
            .filter(|m| !m.maturity.has_passed(now))
            .copied()
            .collect())
    }

    fn quote_lend(
        &self,
        currency: CurrencyId,
        maturity: Timestamp,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, VenueError> {
        self.check_currency(currency)?;
        let market = self.live_market(maturity, now)?;

        let fee = match (self.lend_fee, tenor_from_ordinal(market.ordinal)) {
            (Some(model), Some(tenor)) => model
                .cost(amount, maturity, tenor, now)
                .map_err(|e| VenueError::Rejected(e.to_string()))?,
            _ => Amount::ZERO,
        };
        let net = amount.checked_sub(fee)?;

        let factor = Self::growth_factor(market.oracle_rate, maturity, now)?;
        Ok(Amount(fixed_point::mul_wad(net.units(), factor)?))
    }

    fn present_value(
        &self,
        currency: CurrencyId,
        maturity: Timestamp,
        claims: Amount,
        now: Timestamp,
    ) -> Result<Amount, VenueError> {
        self.check_currency(currency)?;
        if maturity.has_passed(now) {
            return Ok(claims);
        }
        let market = self.live_market(maturity, now)?;
        let factor = Self::growth_factor(market.oracle_rate, maturity, now)?;
        Ok(Amount(fixed_point::div_wad(claims.units(), factor)?))
    }

    fn initialize_markets(&mut self, currency: CurrencyId, now: Timestamp) -> Result<(), VenueError> {
        self.check_currency(currency)?;
        self.markets.retain(|m| !m.maturity.has_passed(now));
        for market in std::mem::take(&mut self.queued) {
            self.list_market(market.ordinal, market.maturity, market.oracle_rate);
        }
        self.initializations += 1;
        Ok(())
    }

    fn transfer_underlying(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), VenueError> {
        self.check_writable()?;
        self.debit_underlying(from, amount)?;
        self.fund(to, amount);
        Ok(())
    }

    fn mint_via_underlying(
        &mut self,
        currency: CurrencyId,
        maturity: Timestamp,
        amount: Amount,
        claims: Amount,
        holder: AccountId,
        now: Timestamp,
    ) -> Result<(), VenueError> {
        self.check_currency(currency)?;
        self.check_writable()?;
        self.live_market(maturity, now)?;
        self.debit_underlying(holder, amount)?;

        let held = self.claims.entry((holder, maturity)).or_default();
        *held = held.checked_add(claims)?;
        Ok(())
    }

    fn redeem_to_underlying(
        &mut self,
        currency: CurrencyId,
        maturity: Timestamp,
        claims: Amount,
        holder: AccountId,
        recipient: AccountId,
        now: Timestamp,
    ) -> Result<Amount, VenueError> {
        self.check_currency(currency)?;
        self.check_writable()?;

        let held = self.claims_of(holder, maturity);
        if held < claims {
            return Err(VenueError::InsufficientClaims {
                maturity,
                requested: claims,
                available: held,
            });
        }
        let proceeds = self.present_value(currency, maturity, claims, now)?;

        let remaining = held.checked_sub(claims)?;
        if remaining.is_zero() {
            self.claims.remove(&(holder, maturity));
        } else {
            self.claims.insert((holder, maturity), remaining);
        }
        self.fund(recipient, proceeds);
        Ok(proceeds)
    }
}
