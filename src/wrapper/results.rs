// 7.0.2: result types and errors for wrapper operations.

use crate::fee::FeeError;
use crate::fixed_point::MathError;
use crate::ledger::LedgerError;
use crate::market::MarketError;
use crate::types::{Amount, Rate, Timestamp};
use crate::venue::VenueError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositResult {
    pub maturity: Timestamp,
    pub tenor_months: u16,
    pub fee: Amount,
    /// claim units received, also the wrapper units minted
    pub claims: Amount,
    /// principal basis added to the position
    pub deposited: Amount,
    pub opened: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawResult {
    pub burned: Amount,
    pub pct: Rate,
    /// underlying paid out
    pub proceeds: Amount,
    pub positions_closed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferResult {
    pub amount: Amount,
    pub positions_moved: usize,
    pub positions_closed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinvestResult {
    pub from_maturity: Timestamp,
    pub to_maturity: Timestamp,
    pub proceeds: Amount,
    pub claims: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WrapperError {
    #[error("Amount must be greater than zero")]
    EmptyAmount,

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Venue quoted zero claim units for maturity {0}")]
    NothingLent(Timestamp),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Fee error: {0}")]
    Fee(#[from] FeeError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}
