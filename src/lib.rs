// term-collateral: fixed-term lending wrapper plus a collateral plugin over it.
// the wrapper turns one underlying into a fungible token backed by positions in
// fixed-maturity markets. the collateral half reads the pooled rate and guards
// it with revenue hiding and a peg oracle.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, Timestamp, Amount, Rate, tenor ladder
//   1.5  fixed_point.rs: 1e18 math with 256-bit intermediates
//   2.x  fee.rs: entry fee, decays linearly to maturity
//   3.x  venue.rs: lending venue capability + deterministic mock
//   4.x  market.rs: active market view, best market selection
//   5.x  position.rs: per-maturity position, proration
//   6.x  ledger.rs: balances and positions per account
//   7.x  wrapper/: deposit, withdraw, transfer, reinvest, rates
//   8.x  config.rs: wrapper and collateral params, env presets
//   9.x  collateral.rs: revenue hiding + status machine
//   9.5  oracle.rs: peg oracle capability + mock
//   11.x events.rs: state transition events for audit

// accounting
pub mod fee;
pub mod fixed_point;
pub mod ledger;
pub mod market;
pub mod position;
pub mod types;
pub mod wrapper;

// collateral
pub mod collateral;
pub mod oracle;

// integration
pub mod config;
pub mod events;
pub mod venue;

// re exports for convenience
pub use collateral::{
    CollateralError, CollateralRateState, CollateralStatus, FixedTermCollateral, PegCheck, RateSource,
    RevenueHidingTracker,
};
pub use config::{CollateralConfig, ConfigError, DeploymentConfig, Environment, WrapperConfig};
pub use events::*;
pub use fee::{EntryFeeModel, FeeError, DEFAULT_ANNUAL_FEE};
pub use fixed_point::{MathError, WAD};
pub use ledger::{LedgerError, PositionLedger};
pub use market::{Market, MarketCatalog, MarketError};
pub use oracle::{MockFailure, MockPegOracle, OracleError, PegOracle};
pub use position::{prorate, Position, PositionSlice};
pub use types::*;
pub use venue::{MockCheckpoint, MockVenue, Venue, VenueError, VenueMarket};
pub use wrapper::{DepositResult, FixedTermWrapper, ReinvestResult, TransferResult, WithdrawResult, WrapperError};
