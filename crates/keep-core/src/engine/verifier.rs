//! # Signature Verifier
//!
//! Validates a signature set against the digest of an operation at the
//! current nonce. Exactly `quorum` entries are consulted; each must recover
//! to a member, the members must be strictly ascending, and contract signers
//! must confirm through delegated validation.

use super::Keep;
use crate::domain::digest::execute_digest;
use crate::domain::entities::{execution_id, Operation, VALID_SIGNATURE_MAGIC};
use crate::domain::invariants::enforce_ordering;
use crate::errors::{KeepError, SignatureRejection};
use crate::ports::outbound::{ExecutionRuntime, MembershipLedger};
use keep_signature::{recover_address, Signature};
use keep_types::{Address, Hash};
use tracing::debug;

impl<L: MembershipLedger, R: ExecutionRuntime> Keep<L, R> {
    /// Digest the quorum must sign for `operation` at the current nonce.
    #[must_use]
    pub fn digest(&self, operation: &Operation) -> Hash {
        execute_digest(&self.domain_separator(), operation, self.state.nonce)
    }

    /// Checks `signatures` against `operation` at the current nonce.
    ///
    /// Surplus entries beyond the quorum are ignored.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` with the first rejection encountered.
    pub fn verify(&self, operation: &Operation, signatures: &[Signature]) -> Result<(), KeepError> {
        let required = self.state.quorum;
        let consulted = usize::try_from(required)
            .ok()
            .and_then(|n| signatures.get(..n))
            .ok_or(KeepError::InvalidSignature(SignatureRejection::Missing {
                supplied: signatures.len(),
                required,
            }))?;

        let digest = self.digest(operation);
        let mut previous = Address::ZERO;

        for signature in consulted {
            let signer = self
                .check_entry(&digest, signature, previous)
                .map_err(KeepError::InvalidSignature)?;
            previous = signer;
        }

        debug!(nonce = self.state.nonce, signers = consulted.len(), "Signature set accepted");
        Ok(())
    }

    fn check_entry(
        &self,
        digest: &Hash,
        signature: &Signature,
        previous: Address,
    ) -> Result<Address, SignatureRejection> {
        let signer = recover_address(digest, signature).map_err(SignatureRejection::Recovery)?;

        if self.runtime.has_code(signer) {
            let marker = self
                .runtime
                .is_valid_signature(signer, digest, &signature.to_bytes());
            if marker != VALID_SIGNATURE_MAGIC {
                return Err(SignatureRejection::DelegateRejected(signer));
            }
        }

        if self.ledger.balance_of(signer, execution_id()).is_zero() {
            return Err(SignatureRejection::NotMember(signer));
        }

        enforce_ordering(previous, signer)?;
        Ok(signer)
    }
}
