//! # Membership & Quorum Guard
//!
//! Capability-gated entry points. Every weight- or threshold-changing path
//! re-checks `0 < quorum <= total weight` before it commits.

use super::Keep;
use crate::domain::entities::{execution_id, Capability};
use crate::domain::invariants::{enforce_threshold, enforce_within_supply};
use crate::errors::KeepError;
use crate::events::KeepEvent;
use crate::ports::outbound::{ExecutionRuntime, MembershipLedger};
use keep_types::{Address, TokenId, U256};
use tracing::info;

impl<L: MembershipLedger, R: ExecutionRuntime> Keep<L, R> {
    // =========================================================================
    // CAPABILITIES
    // =========================================================================

    /// Whether `caller` may use `capability`: the unit itself always may,
    /// other accounts need a non-zero balance of the capability id.
    #[must_use]
    pub fn is_privileged(&self, caller: Address, capability: Capability) -> bool {
        caller == self.state.unit || !self.ledger.balance_of(caller, capability.id()).is_zero()
    }

    pub(crate) fn require(&self, caller: Address, capability: Capability) -> Result<(), KeepError> {
        if self.is_privileged(caller, capability) {
            Ok(())
        } else {
            Err(KeepError::NotAuthorized { caller })
        }
    }

    // =========================================================================
    // WEIGHT
    // =========================================================================

    /// Grants `amount` of `id` to `to`.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` without the mint capability, or a ledger error.
    pub fn mint(&mut self, caller: Address, to: Address, id: TokenId, amount: U256) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::Mint)?;
            keep.ledger.mint(to, id, amount)?;
            keep.emit(KeepEvent::TransferSingle {
                operator: caller,
                from: Address::ZERO,
                to,
                id,
                amount,
            });
            Ok(())
        })
    }

    /// Revokes `amount` of `id` from `from`.
    ///
    /// Holders may burn their own balance and approved operators may burn on
    /// their behalf; anyone else needs the burn capability.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized`
    /// - `QuorumExceedsSupply` when revoking weight would leave fewer members
    ///   than the quorum
    /// - a ledger error
    pub fn burn(&mut self, caller: Address, from: Address, id: TokenId, amount: U256) -> Result<(), KeepError> {
        self.atomic(|keep| {
            let authorized = caller == from
                || keep.ledger.is_approved_for_all(from, caller)
                || keep.is_privileged(caller, Capability::Burn);
            if !authorized {
                return Err(KeepError::NotAuthorized { caller });
            }

            keep.ledger.burn(from, id, amount)?;
            if id == execution_id() {
                enforce_within_supply(keep.state.quorum, keep.ledger.total_supply(id))?;
            }

            keep.emit(KeepEvent::TransferSingle {
                operator: caller,
                from,
                to: Address::ZERO,
                id,
                amount,
            });
            Ok(())
        })
    }

    // =========================================================================
    // QUORUM
    // =========================================================================

    /// Installs a new quorum threshold.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`, `InvalidThreshold` or `QuorumExceedsSupply`.
    pub fn set_quorum(&mut self, caller: Address, threshold: u64) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::SetQuorum)?;
            enforce_threshold(threshold, keep.ledger.total_supply(execution_id()))?;
            keep.state.quorum = threshold;
            info!(unit = %keep.state.unit, threshold, "Quorum set");
            keep.emit(KeepEvent::QuorumSet { caller, threshold });
            Ok(())
        })
    }

    // =========================================================================
    // TOKEN SETTINGS
    // =========================================================================

    /// Makes `id` transferable between holders, or not.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`.
    pub fn set_transferability(&mut self, caller: Address, id: TokenId, on: bool) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::SetTransferability)?;
            keep.ledger.set_transferability(id, on);
            keep.emit(KeepEvent::TransferabilitySet {
                operator: caller,
                id,
                on,
            });
            Ok(())
        })
    }

    /// Sets the unit's own metadata URI for `id`.
    ///
    /// # Errors
    ///
    /// `NotAuthorized`.
    pub fn set_uri(&mut self, caller: Address, id: TokenId, uri: String) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::SetUri)?;
            keep.state.uris.insert(id, uri.clone());
            keep.emit(KeepEvent::Uri { value: uri, id });
            Ok(())
        })
    }

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    /// Moves `amount` of `id` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - `NotAuthorized` unless the caller is `from` or its operator
    /// - `NonTransferable` unless the id is transferable or the caller is the
    ///   unit itself
    /// - a ledger error
    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: TokenId,
        amount: U256,
    ) -> Result<(), KeepError> {
        self.atomic(|keep| {
            if caller != from && !keep.ledger.is_approved_for_all(from, caller) {
                return Err(KeepError::NotAuthorized { caller });
            }
            if caller != keep.state.unit && !keep.ledger.transferable(id) {
                return Err(KeepError::NonTransferable(id));
            }
            keep.ledger.transfer(from, to, id, amount)?;
            keep.emit(KeepEvent::TransferSingle {
                operator: caller,
                from,
                to,
                id,
                amount,
            });
            Ok(())
        })
    }

    /// Approves or revokes `operator` over all of the caller's tokens.
    pub fn set_approval_for_all(&mut self, caller: Address, operator: Address, approved: bool) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.ledger.set_approval_for_all(caller, operator, approved);
            keep.emit(KeepEvent::ApprovalForAll {
                owner: caller,
                operator,
                approved,
            });
            Ok(())
        })
    }
}
