//! # Keep Redemption
//!
//! Pro-rata redemption of the assets a Keep unit holds, paid to holders who
//! burn a unit-issued token.
//!
//! ## Flow
//!
//! 1. The unit records a start time with `set_redemption_start`
//! 2. The holder approves the calculator as operator on the unit; the unit
//!    approves the calculator as spender of its assets
//! 3. `redeem` reads supply, burns, and pays `amount * balance / supply`
//!    (rounded down) of each asset, skipping zero shares

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod errors;
pub mod ports;
pub mod redemption;

pub use adapters::{InMemoryAssets, ManualClock, SystemClock};
pub use errors::{AssetError, RedemptionError};
pub use ports::{AssetLedger, Clock, RedeemableUnit};
pub use redemption::{mul_div_down, Payout, RedemptionCalculator, RedemptionEvent};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
