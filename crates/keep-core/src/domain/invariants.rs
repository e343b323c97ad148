//! # Domain Invariants
//!
//! Conditions that hold at every observable point after initialization:
//!
//! - Quorum bounds: `0 < quorum <= total weight`
//! - Signer ordering: accepted signers are strictly ascending, starting above
//!   the zero address
//! - Replay counter: the nonce only moves forward, one step per dispatch

use crate::errors::{KeepError, SignatureRejection};
use keep_types::{Address, U256};

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Quorum bounds hold for `quorum` against `total_weight`.
#[must_use]
pub fn check_quorum_invariant(quorum: u64, total_weight: U256) -> bool {
    quorum > 0 && U256::from(quorum) <= total_weight
}

/// `signer` may follow `previous` in a signature set.
#[must_use]
pub fn check_ordering_invariant(previous: Address, signer: Address) -> bool {
    signer > previous
}

/// `after` is the nonce that must follow `before` once one operation has run.
#[must_use]
pub fn check_nonce_invariant(before: u64, after: u64) -> bool {
    before.checked_add(1) == Some(after)
}

// =============================================================================
// ENFORCEMENT
// =============================================================================

/// Validates a threshold about to be installed.
///
/// # Errors
///
/// - `InvalidThreshold` for zero
/// - `QuorumExceedsSupply` above `total_weight`
pub fn enforce_threshold(threshold: u64, total_weight: U256) -> Result<(), KeepError> {
    if threshold == 0 {
        return Err(KeepError::InvalidThreshold);
    }
    enforce_within_supply(threshold, total_weight)
}

/// Validates that the current quorum still fits after weight was revoked.
///
/// # Errors
///
/// `QuorumExceedsSupply` when `quorum > total_weight`.
pub fn enforce_within_supply(quorum: u64, total_weight: U256) -> Result<(), KeepError> {
    if U256::from(quorum) > total_weight {
        return Err(KeepError::QuorumExceedsSupply {
            quorum,
            supply: total_weight,
        });
    }
    Ok(())
}

/// Validates strict ascending order between consecutive signers.
///
/// # Errors
///
/// `OutOfOrder` for duplicates and descending pairs.
pub fn enforce_ordering(previous: Address, signer: Address) -> Result<(), SignatureRejection> {
    if check_ordering_invariant(previous, signer) {
        Ok(())
    } else {
        Err(SignatureRejection::OutOfOrder { previous, signer })
    }
}

// =============================================================================
// TESTS
// =============================================================================
