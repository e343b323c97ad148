//! # Initialization Sequencer
//!
//! One-time setup: bootstrap operations, membership seeding, quorum and the
//! cached domain separator.

use super::Keep;
use crate::domain::entities::{execution_id, Operation};
use crate::domain::invariants::enforce_ordering;
use crate::domain::separator::DomainSeparator;
use crate::errors::KeepError;
use crate::events::KeepEvent;
use crate::ports::outbound::{ExecutionRuntime, MembershipLedger};
use keep_types::{Address, U256};
use tracing::info;

impl<L: MembershipLedger, R: ExecutionRuntime> Keep<L, R> {
    /// Sets the unit up. Runs exactly once.
    ///
    /// Order of effects:
    /// 1. every bootstrap operation is dispatched with the unit as caller
    /// 2. each signer receives one unit of membership weight
    /// 3. the quorum is installed
    /// 4. the domain separator is cached for the live chain id
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` when a quorum is already set
    /// - `InvalidThreshold` for a zero threshold
    /// - `QuorumExceedsSupply` when the threshold exceeds the signer count
    /// - `InvalidSignature(OutOfOrder)` when signers are not strictly ascending
    /// - `ExecutionFailed` when a bootstrap operation fails
    pub fn initialize(
        &mut self,
        calls: &[Operation],
        signers: &[Address],
        threshold: u64,
    ) -> Result<(), KeepError> {
        if self.state.is_initialized() {
            return Err(KeepError::AlreadyInitialized);
        }
        if threshold == 0 {
            return Err(KeepError::InvalidThreshold);
        }
        let signer_count = U256::from(signers.len() as u64);
        if U256::from(threshold) > signer_count {
            return Err(KeepError::QuorumExceedsSupply {
                quorum: threshold,
                supply: signer_count,
            });
        }

        self.atomic(|keep| {
            for operation in calls {
                keep.dispatch(operation)?;
            }

            let unit = keep.state.unit;
            let mut previous = Address::ZERO;
            for &signer in signers {
                enforce_ordering(previous, signer).map_err(KeepError::InvalidSignature)?;
                keep.ledger.mint(signer, execution_id(), U256::one())?;
                keep.emit(KeepEvent::TransferSingle {
                    operator: unit,
                    from: Address::ZERO,
                    to: signer,
                    id: execution_id(),
                    amount: U256::one(),
                });
                previous = signer;
            }

            keep.state.quorum = threshold;
            keep.state.separator = Some(DomainSeparator::new(keep.runtime.chain_id(), unit));
            keep.emit(KeepEvent::QuorumSet {
                caller: unit,
                threshold,
            });

            info!(%unit, signers = signers.len(), threshold, "Keep initialized");
            Ok(())
        })
    }
}
