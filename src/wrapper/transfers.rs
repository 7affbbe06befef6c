//! Transfers: wrapper units move between holders and drag the same share of
//! every position with them.

use super::core::FixedTermWrapper;
use super::results::{TransferResult, WrapperError};
use crate::events::{CloseReason, EventPayload, PositionClosedEvent, PositionOpenedEvent, TransferEvent};
use crate::position::prorate;
use crate::types::{AccountId, Amount};
use crate::venue::Venue;
use tracing::{debug, info};

impl<V: Venue> FixedTermWrapper<V> {
    /// Zero-amount and self transfers succeed without touching any position.
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<TransferResult, WrapperError> {
        let balance = self.ledger.balance_of(from);
        if amount > balance {
            return Err(WrapperError::InsufficientBalance {
                requested: amount,
                available: balance,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(TransferResult {
                amount,
                ..TransferResult::default()
            });
        }

        let (result, events) = self.atomically(|w| {
            let hook = w.on_transfer(from, to, amount)?;
            w.ledger.move_balance(from, to, amount)?;
            Ok(hook)
        })?;
        self.emit_events(events);

        info!(from = from.0, to = to.0, %amount, moved = result.positions_moved, "transfer");
        Ok(result)
    }

    // 7.4: the transfer hook. mirrors withdraw proration but credits the receiver
    // at the same maturity instead of redeeming.
    fn on_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(TransferResult, Vec<EventPayload>), WrapperError> {
        let slices = prorate(&self.ledger.positions_of(from), amount)?;
        let mut events = Vec::new();
        let mut closed = 0;

        for slice in &slices {
            if self.ledger.debit(from, slice.maturity, slice.lent, slice.deposited)? {
                closed += 1;
                events.push(EventPayload::PositionClosed(PositionClosedEvent {
                    account_id: from,
                    maturity: slice.maturity,
                    reason: CloseReason::TransferredOut,
                }));
            }
            let opened = self
                .ledger
                .credit(to, slice.maturity, slice.tenor_months, slice.lent, slice.deposited)?;
            if opened {
                events.push(EventPayload::PositionOpened(PositionOpenedEvent {
                    account_id: to,
                    maturity: slice.maturity,
                    tenor_months: slice.tenor_months,
                }));
            }
            debug!(
                from = from.0,
                to = to.0,
                maturity = %slice.maturity,
                claims = %slice.lent,
                deposited = %slice.deposited,
                "position share moved"
            );
        }

        events.push(EventPayload::Transfer(TransferEvent {
            from,
            to,
            amount,
            positions_moved: slices.len(),
        }));

        Ok((
            TransferResult {
                amount,
                positions_moved: slices.len(),
                positions_closed: closed,
            },
            events,
        ))
    }
}
