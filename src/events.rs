// 11.0: every ledger mutation produces an event. used for audit trails and for
// notifying external systems. the EventPayload enum lists all event types.

use crate::types::{AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Balance events
    Deposit(DepositEvent),
    Withdrawal(WithdrawalEvent),
    Transfer(TransferEvent),

    // Position events
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    Reinvested(ReinvestedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub account_id: AccountId,
    pub maturity: Timestamp,
    pub amount: Amount,
    pub fee: Amount,
    pub claims: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub proceeds: Amount,
    pub new_balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub positions_moved: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub account_id: AccountId,
    pub maturity: Timestamp,
    pub tenor_months: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub account_id: AccountId,
    pub maturity: Timestamp,
    pub reason: CloseReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Withdrawn,
    TransferredOut,
    Matured,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinvestedEvent {
    pub account_id: AccountId,
    pub from_maturity: Timestamp,
    pub to_maturity: Timestamp,
    pub proceeds: Amount,
    pub claims: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes() {
        let event = Event::new(
            EventId(1),
            Timestamp::from_secs(1000),
            EventPayload::PositionClosed(PositionClosedEvent {
                account_id: AccountId(7),
                maturity: Timestamp::from_days(90),
                reason: CloseReason::Matured,
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Matured"));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, EventId(1));
    }
}
