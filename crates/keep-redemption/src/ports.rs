//! # Ports
//!
//! What the calculator needs from the unit, the asset ledger and the clock.

use crate::errors::AssetError;
use keep_core::errors::KeepError;
use keep_core::ports::outbound::Journaled;
use keep_types::{Address, TokenId, U256};

/// A unit whose balances can be redeemed.
pub trait RedeemableUnit: Journaled {
    /// The unit's address (holder of the redeemable assets).
    fn address(&self) -> Address;

    /// Supply of `id`.
    fn total_supply(&self, id: TokenId) -> U256;

    /// Burns through the unit's burn entry point with `caller` as the caller.
    fn burn(&mut self, caller: Address, from: Address, id: TokenId, amount: U256) -> Result<(), KeepError>;
}

/// Fungible assets held by units.
pub trait AssetLedger: Journaled {
    /// Balance of `owner` in `asset`.
    fn balance_of(&self, asset: Address, owner: Address) -> U256;

    /// Moves `amount` of `asset` from `from` to `to`, spending `spender`'s
    /// allowance.
    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), AssetError>;
}

/// Time source in seconds.
pub trait Clock: Send + Sync {
    /// Current timestamp.
    fn now(&self) -> u64;
}
