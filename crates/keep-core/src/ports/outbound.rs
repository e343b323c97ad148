//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the engine depends on. Adapters implement these traits to
//! provide:
//! - The multi-identifier balance ledger
//! - Target execution (calls, delegate calls, contract creation)
//! - Fallback metadata
//! - Event publication
//!
//! Every stateful port is `Journaled`: the engine snapshots it before an
//! entry point runs and restores the snapshot if the entry point fails.

use crate::errors::{LedgerError, RuntimeError};
use crate::events::KeepEventEnvelope;
use keep_types::{Address, Bytes, Hash, TokenId, U256};

// =============================================================================
// JOURNAL
// =============================================================================

/// Checkpoint and rollback of mutable state.
pub trait Journaled {
    /// Opaque checkpoint.
    type Snapshot;

    /// Captures the current state.
    fn snapshot(&self) -> Self::Snapshot;

    /// Rolls back to a captured state.
    fn restore(&mut self, snapshot: Self::Snapshot);
}

// =============================================================================
// MEMBERSHIP LEDGER
// =============================================================================

/// Multi-identifier fungible ledger holding membership weight and
/// capability balances.
///
/// Authorization is the engine's job. The ledger only enforces arithmetic:
/// balances never go negative and supplies never overflow.
pub trait MembershipLedger: Journaled + Send {
    /// Balance of `account` under `id`.
    fn balance_of(&self, account: Address, id: TokenId) -> U256;

    /// Total supply of `id`.
    fn total_supply(&self, id: TokenId) -> U256;

    /// Whether `operator` may move every token of `owner`.
    fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool;

    /// Whether `id` may be moved between holders.
    fn transferable(&self, id: TokenId) -> bool;

    /// Credits `amount` of `id` to `to`.
    fn mint(&mut self, to: Address, id: TokenId, amount: U256) -> Result<(), LedgerError>;

    /// Debits `amount` of `id` from `from`.
    fn burn(&mut self, from: Address, id: TokenId, amount: U256) -> Result<(), LedgerError>;

    /// Moves `amount` of `id` from `from` to `to`.
    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        id: TokenId,
        amount: U256,
    ) -> Result<(), LedgerError>;

    /// Approves or revokes `operator` for all of `owner`'s tokens.
    fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool);

    /// Marks `id` transferable or not.
    fn set_transferability(&mut self, id: TokenId, on: bool);
}

// =============================================================================
// EXECUTION RUNTIME
// =============================================================================

/// The environment operations are dispatched into.
pub trait ExecutionRuntime: Journaled + Send {
    /// Live chain id.
    fn chain_id(&self) -> u64;

    /// Whether `account` has deployed code (is a contract).
    fn has_code(&self, account: Address) -> bool;

    /// Calls `to` from `from`, forwarding `value`.
    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, RuntimeError>;

    /// Runs `target`'s code in `context`'s storage context.
    fn delegate_call(
        &mut self,
        context: Address,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes, RuntimeError>;

    /// Deploys `code` from `from`. A zero address signals a failed creation.
    fn create(&mut self, from: Address, value: U256, code: &[u8]) -> Result<Address, RuntimeError>;

    /// Deploys `code` from `from` at the salt-derived address. A zero address
    /// signals a failed creation.
    fn create2(
        &mut self,
        from: Address,
        value: U256,
        salt: Hash,
        code: &[u8],
    ) -> Result<Address, RuntimeError>;

    /// Delegated signature validation on a contract signer.
    ///
    /// Returns the 4-byte marker the contract answered with. Anything other
    /// than `0x1626ba7e` is a rejection.
    fn is_valid_signature(&self, signer: Address, digest: &Hash, signature: &[u8]) -> [u8; 4];
}

// =============================================================================
// METADATA
// =============================================================================

/// Fallback per-id metadata consulted when the unit has no local value.
pub trait MetadataSource: Send + Sync {
    /// Metadata URI for `id`, if the source knows one.
    fn uri(&self, id: TokenId) -> Option<String>;
}

// =============================================================================
// EVENT PUBLICATION
// =============================================================================

/// Publishes committed events.
pub trait EventPublisher: Send + Sync {
    /// Publishes one event. Returns the number of subscribers that received it.
    fn publish(&self, envelope: KeepEventEnvelope) -> usize;

    /// Total events published.
    fn events_published(&self) -> u64;
}
