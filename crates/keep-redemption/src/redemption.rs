//! # Redemption Calculator
//!
//! Lets a holder burn `amount` of a unit-issued token and receive, for each
//! asset the unit holds, `amount * balance / supply` rounded down, where
//! `supply` is read before the burn.

use crate::errors::RedemptionError;
use crate::ports::{AssetLedger, Clock, RedeemableUnit};
use keep_types::{Address, TokenId, U256, U512};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// `a * b / denominator`, rounded down, without intermediate overflow.
///
/// Returns `None` for a zero denominator or a result above `U256::MAX`.
#[must_use]
pub fn mul_div_down(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product: U512 = a.full_mul(b);
    U256::try_from(product / U512::from(denominator)).ok()
}

/// Events emitted by the calculator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedemptionEvent {
    /// A unit opened redemption of one of its ids.
    RedemptionStartSet {
        /// Unit.
        unit: Address,
        /// Token id.
        id: TokenId,
        /// Start timestamp.
        start: u64,
    },
    /// A holder redeemed.
    Redeemed {
        /// Holder.
        redeemer: Address,
        /// Unit.
        unit: Address,
        /// Token id.
        id: TokenId,
        /// Amount burned.
        amount: U256,
    },
}

/// One asset paid out by a redemption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Asset.
    pub asset: Address,
    /// Amount transferred.
    pub amount: U256,
}

/// Pro-rata redemption calculator.
pub struct RedemptionCalculator<C: Clock> {
    address: Address,
    clock: C,
    starts: HashMap<(Address, TokenId), u64>,
    events: Vec<RedemptionEvent>,
}

impl<C: Clock> RedemptionCalculator<C> {
    /// Calculator deployed at `address`. Redeemers approve this address as
    /// their burn operator; units approve it as spender of their assets.
    pub fn new(address: Address, clock: C) -> Self {
        Self {
            address,
            clock,
            starts: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// The calculator's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Start timestamp recorded for `(unit, id)`; zero when unset.
    #[must_use]
    pub fn redemption_start(&self, unit: Address, id: TokenId) -> u64 {
        self.starts.get(&(unit, id)).copied().unwrap_or_default()
    }

    /// Records when redemption of `id` opens. Called by the unit itself.
    pub fn set_redemption_start(&mut self, caller_unit: Address, id: TokenId, start: u64) {
        self.starts.insert((caller_unit, id), start);
        info!(unit = %caller_unit, %id, start, "Redemption start set");
        self.events.push(RedemptionEvent::RedemptionStartSet {
            unit: caller_unit,
            id,
            start,
        });
    }

    /// Burns `amount` of `id` from `redeemer` and pays out a pro-rata share
    /// of each asset in `assets`.
    ///
    /// Zero payouts are skipped. Any failure rolls back the unit and the
    /// asset ledger.
    ///
    /// # Errors
    ///
    /// - `RedemptionNotStarted`
    /// - `EmptySupply`
    /// - `InvalidAssetOrder` when `assets` is not strictly ascending
    /// - `Burn` when the unit refuses the burn
    /// - `Asset` when a payout transfer fails
    pub fn redeem<U, A>(
        &mut self,
        redeemer: Address,
        unit: &mut U,
        ledger: &mut A,
        assets: &[Address],
        id: TokenId,
        amount: U256,
    ) -> Result<Vec<Payout>, RedemptionError>
    where
        U: RedeemableUnit,
        A: AssetLedger,
    {
        let unit_address = unit.address();
        let start = self.redemption_start(unit_address, id);
        if start == 0 || self.clock.now() < start {
            return Err(RedemptionError::RedemptionNotStarted {
                unit: unit_address,
                id,
            });
        }

        let supply = unit.total_supply(id);
        if supply.is_zero() {
            return Err(RedemptionError::EmptySupply(id));
        }

        let unit_checkpoint = unit.snapshot();
        let ledger_checkpoint = ledger.snapshot();

        match self.pay_out(redeemer, unit, ledger, assets, id, amount, supply) {
            Ok(payouts) => {
                info!(%redeemer, unit = %unit_address, %id, %amount, payouts = payouts.len(), "Redeemed");
                self.events.push(RedemptionEvent::Redeemed {
                    redeemer,
                    unit: unit_address,
                    id,
                    amount,
                });
                Ok(payouts)
            }
            Err(err) => {
                warn!(%redeemer, unit = %unit_address, error = %err, "Redemption rolled back");
                unit.restore(unit_checkpoint);
                ledger.restore(ledger_checkpoint);
                Err(err)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn pay_out<U, A>(
        &self,
        redeemer: Address,
        unit: &mut U,
        ledger: &mut A,
        assets: &[Address],
        id: TokenId,
        amount: U256,
        supply: U256,
    ) -> Result<Vec<Payout>, RedemptionError>
    where
        U: RedeemableUnit,
        A: AssetLedger,
    {
        unit.burn(self.address, redeemer, id, amount)?;

        let unit_address = unit.address();
        let mut payouts = Vec::with_capacity(assets.len());
        let mut previous = Address::ZERO;

        for &asset in assets {
            if asset <= previous {
                return Err(RedemptionError::InvalidAssetOrder { previous, asset });
            }
            previous = asset;

            let balance = ledger.balance_of(asset, unit_address);
            // amount <= supply after a successful burn, so the share fits
            let share = mul_div_down(amount, balance, supply).unwrap_or_default();
            if share.is_zero() {
                debug!(%asset, %balance, "Zero share skipped");
                continue;
            }

            ledger.transfer_from(asset, self.address, unit_address, redeemer, share)?;
            payouts.push(Payout {
                asset,
                amount: share,
            });
        }
        Ok(payouts)
    }

    /// Takes the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<RedemptionEvent> {
        std::mem::take(&mut self.events)
    }
}
