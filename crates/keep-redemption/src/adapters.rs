//! # Adapters
//!
//! `Keep` as a redeemable unit, plus in-memory assets and clocks.

use crate::errors::AssetError;
use crate::ports::{AssetLedger, Clock, RedeemableUnit};
use keep_core::engine::Keep;
use keep_core::errors::KeepError;
use keep_core::ports::outbound::{ExecutionRuntime, Journaled, MembershipLedger};
use keep_types::{Address, TokenId, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// =============================================================================
// UNIT
// =============================================================================

impl<L: MembershipLedger, R: ExecutionRuntime> RedeemableUnit for Keep<L, R> {
    fn address(&self) -> Address {
        Keep::address(self)
    }

    fn total_supply(&self, id: TokenId) -> U256 {
        Keep::total_supply(self, id)
    }

    fn burn(&mut self, caller: Address, from: Address, id: TokenId, amount: U256) -> Result<(), KeepError> {
        Keep::burn(self, caller, from, id, amount)
    }
}

// =============================================================================
// ASSETS
// =============================================================================

/// Fungible asset balances and allowances in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryAssets {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
}

impl InMemoryAssets {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` of `asset` to `owner`.
    pub fn mint(&mut self, asset: Address, owner: Address, amount: U256) {
        let entry = self.balances.entry((asset, owner)).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Sets `spender`'s allowance over `owner`'s `asset`.
    pub fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((asset, owner, spender), amount);
    }

    /// Remaining allowance.
    #[must_use]
    pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_default()
    }
}

impl Journaled for InMemoryAssets {
    type Snapshot = InMemoryAssets;

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}

impl AssetLedger for InMemoryAssets {
    fn balance_of(&self, asset: Address, owner: Address) -> U256 {
        self.balances.get(&(asset, owner)).copied().unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), AssetError> {
        let allowance = self.allowance(asset, from, spender);
        if allowance < amount {
            return Err(AssetError::InsufficientAllowance {
                asset,
                owner: from,
                spender,
            });
        }
        let balance = self.balance_of(asset, from);
        if balance < amount {
            return Err(AssetError::InsufficientBalance {
                asset,
                owner: from,
                balance,
                required: amount,
            });
        }

        self.allowances.insert((asset, from, spender), allowance - amount);
        self.balances.insert((asset, from), balance - amount);
        self.mint(asset, to, amount);
        Ok(())
    }
}

// =============================================================================
// CLOCKS
// =============================================================================

/// Wall-clock seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock reading `now`.
    #[must_use]
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
