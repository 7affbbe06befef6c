//! Position ledger and wrapper-token balances.
//!
//! Positions live in one dense arena. Each account keeps a small ordered list
//! of arena indices (iteration order = order the maturities were opened) plus a
//! maturity → index map for constant-time membership checks. An account's
//! wrapper balance always equals the sum of `lent_amount` over its positions.

use crate::fixed_point::MathError;
use crate::position::Position;
use crate::types::{AccountId, Amount, Timestamp};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct AccountBook {
    balance: Amount,
    order: Vec<usize>,
    by_maturity: HashMap<Timestamp, usize>,
}

impl AccountBook {
    fn is_idle(&self) -> bool {
        self.balance.is_zero() && self.order.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    slots: Vec<Option<Position>>,
    free: Vec<usize>,
    books: HashMap<AccountId, AccountBook>,
    total_supply: Amount,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.books.get(&account).map(|b| b.balance).unwrap_or_default()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn mint(&mut self, account: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let supply = self.total_supply.checked_add(amount)?;
        let book = self.books.entry(account).or_default();
        book.balance = book.balance.checked_add(amount)?;
        self.total_supply = supply;
        Ok(())
    }

    pub fn burn(&mut self, account: AccountId, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(account);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                account,
                requested: amount,
                available,
            });
        }
        if let Some(book) = self.books.get_mut(&account) {
            book.balance = available.checked_sub(amount)?;
        }
        self.total_supply = self.total_supply.checked_sub(amount)?;
        self.prune(account);
        Ok(())
    }

    pub fn move_balance(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.burn(from, amount)?;
        self.mint(to, amount)
    }

    pub fn has_position(&self, account: AccountId, maturity: Timestamp) -> bool {
        self.books
            .get(&account)
            .is_some_and(|b| b.by_maturity.contains_key(&maturity))
    }

    pub fn position(&self, account: AccountId, maturity: Timestamp) -> Option<&Position> {
        let index = *self.books.get(&account)?.by_maturity.get(&maturity)?;
        self.slots.get(index)?.as_ref()
    }

    /// Open positions of `account` in the order they were opened.
    pub fn positions_of(&self, account: AccountId) -> Vec<Position> {
        self.books
            .get(&account)
            .map(|book| {
                book.order
                    .iter()
                    .filter_map(|&i| self.slots.get(i).and_then(|s| *s))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn maturities_of(&self, account: AccountId) -> Vec<Timestamp> {
        self.positions_of(account).iter().map(|p| p.maturity).collect()
    }

    pub fn all_positions(&self) -> impl Iterator<Item = &Position> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn total_lent(&self) -> Result<Amount, MathError> {
        Amount::checked_sum(self.all_positions().map(|p| p.lent_amount))
    }

    pub fn total_deposited(&self) -> Result<Amount, MathError> {
        Amount::checked_sum(self.all_positions().map(|p| p.deposited_amount))
    }

    /// Adds to the position at `maturity`, opening it if absent. Returns true when opened.
    pub fn credit(
        &mut self,
        account: AccountId,
        maturity: Timestamp,
        tenor_months: u16,
        lent: Amount,
        deposited: Amount,
    ) -> Result<bool, LedgerError> {
        let existing = self
            .books
            .get(&account)
            .and_then(|b| b.by_maturity.get(&maturity))
            .copied();
        if let Some(index) = existing {
            let position = self
                .slots
                .get_mut(index)
                .and_then(|s| s.as_mut())
                .ok_or(LedgerError::PositionNotFound { account, maturity })?;
            position.add(lent, deposited)?;
            return Ok(false);
        }

        let mut position = Position::new(maturity, tenor_months);
        position.add(lent, deposited)?;
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(position);
                index
            }
            None => {
                self.slots.push(Some(position));
                self.slots.len() - 1
            }
        };

        let book = self.books.entry(account).or_default();
        book.order.push(index);
        book.by_maturity.insert(maturity, index);
        Ok(true)
    }

    /// Takes from the position at `maturity`, deleting it once no claim units remain.
    /// Returns true when deleted.
    pub fn debit(
        &mut self,
        account: AccountId,
        maturity: Timestamp,
        lent: Amount,
        deposited: Amount,
    ) -> Result<bool, LedgerError> {
        let index = self
            .books
            .get(&account)
            .and_then(|b| b.by_maturity.get(&maturity))
            .copied()
            .ok_or(LedgerError::PositionNotFound { account, maturity })?;
        let position = self
            .slots
            .get_mut(index)
            .and_then(|s| s.as_mut())
            .ok_or(LedgerError::PositionNotFound { account, maturity })?;

        position.remove(lent, deposited)?;
        if position.is_empty() {
            self.release(account, maturity, index);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn remove_position(&mut self, account: AccountId, maturity: Timestamp) -> Option<Position> {
        let index = *self.books.get(&account)?.by_maturity.get(&maturity)?;
        let position = self.slots.get(index).and_then(|s| *s);
        self.release(account, maturity, index);
        position
    }

    fn release(&mut self, account: AccountId, maturity: Timestamp, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
            self.free.push(index);
        }
        if let Some(book) = self.books.get_mut(&account) {
            book.by_maturity.remove(&maturity);
            book.order.retain(|&i| i != index);
        }
        self.prune(account);
    }

    fn prune(&mut self, account: AccountId) {
        if self.books.get(&account).is_some_and(|b| b.is_idle()) {
            self.books.remove(&account);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient balance for {account:?}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: AccountId,
        requested: Amount,
        available: Amount,
    },

    #[error("No position for {account:?} at maturity {maturity}")]
    PositionNotFound { account: AccountId, maturity: Timestamp },

    #[error("Ledger math: {0}")]
    Math(#[from] MathError),
}
