//! Withdrawals: burn wrapper units and redeem the same share of every position.

use super::core::FixedTermWrapper;
use super::results::{WithdrawResult, WrapperError};
use crate::events::{CloseReason, EventPayload, PositionClosedEvent, WithdrawalEvent};
use crate::position::prorate;
use crate::types::{AccountId, Amount};
use crate::venue::Venue;
use tracing::{debug, info};

impl<V: Venue> FixedTermWrapper<V> {
    pub fn withdraw(&mut self, account: AccountId, amount: Amount) -> Result<WithdrawResult, WrapperError> {
        if amount.is_zero() {
            return Err(WrapperError::EmptyAmount);
        }
        let balance = self.ledger.balance_of(account);
        if amount > balance {
            return Err(WrapperError::InsufficientBalance {
                requested: amount,
                available: balance,
            });
        }

        let now = self.current_time;
        let currency = self.catalog.currency();
        let custody = self.config.custody;
        let pct = amount.ratio_to(balance)?;
        let slices = prorate(&self.ledger.positions_of(account), amount)?;

        let (proceeds, closed) = self.atomically(|w| {
            w.ledger.burn(account, amount)?;
            let mut closed = Vec::new();
            for slice in &slices {
                if w.ledger.debit(account, slice.maturity, slice.lent, slice.deposited)? {
                    closed.push(slice.maturity);
                }
            }

            let mut proceeds = Amount::ZERO;
            for slice in slices.iter().filter(|s| !s.lent.is_zero()) {
                let paid = w
                    .venue
                    .redeem_to_underlying(currency, slice.maturity, slice.lent, custody, account, now)?;
                debug!(account = account.0, maturity = %slice.maturity, claims = %slice.lent, %paid, "redeemed");
                proceeds = proceeds.checked_add(paid)?;
            }
            Ok((proceeds, closed))
        })?;

        let mut events: Vec<EventPayload> = closed
            .iter()
            .map(|&maturity| {
                EventPayload::PositionClosed(PositionClosedEvent {
                    account_id: account,
                    maturity,
                    reason: CloseReason::Withdrawn,
                })
            })
            .collect();
        events.push(EventPayload::Withdrawal(WithdrawalEvent {
            account_id: account,
            amount,
            proceeds,
            new_balance: self.ledger.balance_of(account),
        }));
        self.emit_events(events);

        info!(account = account.0, %amount, %pct, %proceeds, "withdraw");

        Ok(WithdrawResult {
            burned: amount,
            pct,
            proceeds,
            positions_closed: closed.len(),
        })
    }
}
