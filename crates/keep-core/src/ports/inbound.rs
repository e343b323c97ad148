//! # Driving Ports (API - Inbound)
//!
//! The public surface of a running unit. `KeepService` implements it; every
//! call is one atomic step guarded against re-entry.

use crate::domain::entities::{KeepCall, Operation};
use crate::errors::KeepError;
use keep_signature::Signature;
use keep_types::{Address, Hash, TokenId, U256};

/// Entry points and views of a unit.
///
/// Views return `Result` because they are refused (with `Reentrancy`) while
/// an entry point is running on the calling thread.
pub trait KeepApi: Send + Sync {
    // =========================================================================
    // ENTRY POINTS
    // =========================================================================

    /// One-time setup.
    fn initialize(
        &self,
        calls: Vec<Operation>,
        signers: Vec<Address>,
        threshold: u64,
    ) -> Result<(), KeepError>;

    /// Quorum-signed execution.
    fn execute(&self, operation: Operation, signatures: Vec<Signature>) -> Result<(), KeepError>;

    /// Capability-gated single dispatch.
    fn relay(&self, caller: Address, operation: Operation) -> Result<(), KeepError>;

    /// Capability-gated batch dispatch.
    fn multirelay(&self, caller: Address, operations: Vec<Operation>) -> Result<(), KeepError>;

    /// Several entry points as one step.
    fn multicall(&self, caller: Address, calls: Vec<KeepCall>) -> Result<(), KeepError>;

    /// One administrative entry point (mint, burn, set quorum and the rest).
    fn call(&self, caller: Address, call: KeepCall) -> Result<(), KeepError>;

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// Current quorum.
    fn quorum(&self) -> Result<u64, KeepError>;

    /// Current replay counter.
    fn nonce(&self) -> Result<u64, KeepError>;

    /// Digest to sign for `operation` at the current nonce.
    fn digest(&self, operation: &Operation) -> Result<Hash, KeepError>;

    /// Separator for the live chain id.
    fn domain_separator(&self) -> Result<Hash, KeepError>;

    /// Ledger balance.
    fn balance_of(&self, account: Address, id: TokenId) -> Result<U256, KeepError>;

    /// Ledger supply.
    fn total_supply(&self, id: TokenId) -> Result<U256, KeepError>;

    /// Metadata URI with fallback.
    fn uri(&self, id: TokenId) -> Result<String, KeepError>;
}
