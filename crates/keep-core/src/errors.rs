//! # Error Types
//!
//! All error types for the authorization engine and its collaborators.
//!
//! Every entry point is atomic: when one of these errors is returned, no
//! ledger, runtime, counter or event mutation from that call survives.

use keep_signature::SignatureError;
use keep_types::{Address, TokenId, U256};
use thiserror::Error;

// =============================================================================
// KEEP ERRORS
// =============================================================================

/// Errors returned by Keep entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeepError {
    /// `initialize` called on a unit whose quorum is already set.
    #[error("already initialized")]
    AlreadyInitialized,

    /// Signed execution attempted before the unit was initialized.
    #[error("not initialized")]
    NotInitialized,

    /// Quorum threshold of zero.
    #[error("invalid threshold: quorum must be non-zero")]
    InvalidThreshold,

    /// Quorum would exceed total membership weight.
    #[error("quorum {quorum} exceeds total weight {supply}")]
    QuorumExceedsSupply {
        /// Requested or current quorum.
        quorum: u64,
        /// Total weight it was checked against.
        supply: U256,
    },

    /// Signature set rejected.
    #[error("invalid signature: {0}")]
    InvalidSignature(SignatureRejection),

    /// Dispatched call or creation failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Caller lacks the capability for this entry point.
    #[error("not authorized: {caller}")]
    NotAuthorized {
        /// The rejected caller.
        caller: Address,
    },

    /// Token id is not transferable.
    #[error("token {0} is not transferable")]
    NonTransferable(TokenId),

    /// Ledger primitive failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Entry point invoked while another entry point is still running on the
    /// same thread.
    #[error("reentrant call rejected")]
    Reentrancy,
}

impl KeepError {
    /// Returns true if this error came from signature verification.
    #[must_use]
    pub fn is_signature_rejection(&self) -> bool {
        matches!(self, Self::InvalidSignature(_))
    }
}

/// Why a signature set was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureRejection {
    /// Fewer entries than the quorum.
    #[error("{supplied} signatures supplied, {required} required")]
    Missing {
        /// Entries supplied.
        supplied: usize,
        /// Quorum at verification time.
        required: u64,
    },

    /// Cryptographic recovery failed.
    #[error("recovery failed: {0}")]
    Recovery(SignatureError),

    /// Contract signer's delegated validation did not return the marker.
    #[error("delegated validation rejected by {0}")]
    DelegateRejected(Address),

    /// Recovered signer holds no membership weight.
    #[error("{0} is not a member")]
    NotMember(Address),

    /// Signers not strictly ascending (duplicate or out of order).
    #[error("signer {signer} does not follow {previous}")]
    OutOfOrder {
        /// Previous accepted signer.
        previous: Address,
        /// Offending signer.
        signer: Address,
    },
}

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors from the membership ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Balance too small for a burn or transfer.
    #[error("insufficient balance for {account} on token {id}: have {balance}, need {required}")]
    InsufficientBalance {
        /// Account debited.
        account: Address,
        /// Token id.
        id: TokenId,
        /// Current balance.
        balance: U256,
        /// Amount requested.
        required: U256,
    },

    /// Minting would overflow the total supply.
    #[error("supply overflow on token {0}")]
    SupplyOverflow(TokenId),

    /// Tokens cannot be minted to or moved to the zero address.
    #[error("invalid recipient: zero address")]
    ZeroRecipient,
}

// =============================================================================
// RUNTIME ERRORS
// =============================================================================

/// Errors from the target-execution runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Target reverted.
    #[error("reverted: {0}")]
    Reverted(String),

    /// Native value could not be forwarded.
    #[error("insufficient native balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Value requested.
        required: U256,
        /// Value held.
        available: U256,
    },

    /// Runtime unavailable.
    #[error("runtime unavailable: {0}")]
    Unavailable(String),
}

impl From<RuntimeError> for KeepError {
    fn from(err: RuntimeError) -> Self {
        KeepError::ExecutionFailed(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
