// 7.0: the wrapper engine. one fungible token over claims split across several
// fixed-term markets. deposit, withdraw, transfer and reinvest all go through here;
// rate reporting reads venue present values.
// deterministic given a deterministic venue.

mod core;
mod deposits;
mod rates;
mod reinvest;
mod results;
mod transfers;
mod withdrawals;

pub use core::FixedTermWrapper;
pub use results::{DepositResult, ReinvestResult, TransferResult, WithdrawResult, WrapperError};
