//! # Core Domain Entities
//!
//! Operations, self-administration calls and capabilities.

use super::separator::DomainSeparator;
use keep_types::{selector, Address, Bytes, Hash, TokenId, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// OPERATION
// =============================================================================

/// The four execution primitives, with their signed-message discriminants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationKind {
    /// Call the target in the target's own context.
    Call = 0,
    /// Run the target's code in the unit's storage context.
    DelegateCall = 1,
    /// Create a contract at a runtime-assigned address.
    Create = 2,
    /// Create a contract at a salt-derived address.
    Create2 = 3,
}

impl OperationKind {
    /// Discriminant used in the signed message.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for OperationKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            2 => Ok(Self::Create),
            3 => Ok(Self::Create2),
            other => Err(other),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Call => "call",
            Self::DelegateCall => "delegatecall",
            Self::Create => "create",
            Self::Create2 => "create2",
        };
        f.write_str(name)
    }
}

/// An operation the unit can be asked to perform.
///
/// `to` is ignored by the creation kinds. For `Create2`, `data` is the 32-byte
/// salt followed by the creation code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Execution primitive.
    pub kind: OperationKind,
    /// Target account.
    pub to: Address,
    /// Native value forwarded.
    pub value: U256,
    /// Call arguments or creation code.
    pub data: Bytes,
}

impl Operation {
    /// A plain call.
    #[must_use]
    pub fn call(to: Address, value: U256, data: impl Into<Bytes>) -> Self {
        Self {
            kind: OperationKind::Call,
            to,
            value,
            data: data.into(),
        }
    }

    /// A call executed in the unit's storage context.
    #[must_use]
    pub fn delegate_call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            kind: OperationKind::DelegateCall,
            to,
            value: U256::zero(),
            data: data.into(),
        }
    }

    /// Contract creation from `code`.
    #[must_use]
    pub fn create(value: U256, code: impl Into<Bytes>) -> Self {
        Self {
            kind: OperationKind::Create,
            to: Address::ZERO,
            value,
            data: code.into(),
        }
    }

    /// Salted contract creation. The salt travels in the first 32 payload
    /// bytes, so it is covered by the signed digest.
    #[must_use]
    pub fn create2(value: U256, salt: Hash, code: &[u8]) -> Self {
        let mut data = Vec::with_capacity(32 + code.len());
        data.extend_from_slice(salt.as_bytes());
        data.extend_from_slice(code);
        Self {
            kind: OperationKind::Create2,
            to: Address::ZERO,
            value,
            data: Bytes::from(data),
        }
    }

    /// An administrative call the unit makes on itself.
    pub fn self_call(unit: Address, call: &KeepCall) -> Result<Self, bincode::Error> {
        Ok(Self::call(unit, U256::zero(), call.to_payload()?))
    }

    /// Splits a `Create2` payload into `(salt, code)`.
    ///
    /// Returns `None` when the payload is shorter than a salt.
    #[must_use]
    pub fn create2_parts(&self) -> Option<(Hash, &[u8])> {
        let data = self.data.as_slice();
        let salt = Hash::from_slice(data.get(..32)?)?;
        Some((salt, &data[32..]))
    }
}

// =============================================================================
// SELF-ADMINISTRATION CALLS
// =============================================================================

/// Unit entry points reachable by a `Call` operation targeting the unit
/// itself, and by `multicall`.
///
/// Self-calls run with the unit as caller, which passes every capability check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepCall {
    /// Grant ledger balance.
    Mint {
        /// Recipient.
        to: Address,
        /// Token id.
        id: TokenId,
        /// Amount.
        amount: U256,
    },
    /// Revoke ledger balance.
    Burn {
        /// Holder.
        from: Address,
        /// Token id.
        id: TokenId,
        /// Amount.
        amount: U256,
    },
    /// Update the quorum threshold.
    SetQuorum {
        /// New threshold.
        threshold: u64,
    },
    /// Toggle transferability of a token id.
    SetTransferability {
        /// Token id.
        id: TokenId,
        /// Transferable or not.
        on: bool,
    },
    /// Set per-id metadata.
    SetUri {
        /// Token id.
        id: TokenId,
        /// Metadata URI.
        uri: String,
    },
    /// Move tokens between holders.
    SafeTransferFrom {
        /// Sender.
        from: Address,
        /// Recipient.
        to: Address,
        /// Token id.
        id: TokenId,
        /// Amount.
        amount: U256,
    },
    /// Approve or revoke an operator for the caller's tokens.
    SetApprovalForAll {
        /// Operator.
        operator: Address,
        /// Approved or not.
        approved: bool,
    },
    /// Dispatch one operation.
    Relay(Operation),
}

impl KeepCall {
    /// Encodes this call as an operation payload.
    pub fn to_payload(&self) -> Result<Bytes, bincode::Error> {
        bincode::serialize(self).map(Bytes::from)
    }

    /// Decodes an operation payload.
    pub fn from_payload(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
            Self::SetQuorum { .. } => "set_quorum",
            Self::SetTransferability { .. } => "set_transferability",
            Self::SetUri { .. } => "set_uri",
            Self::SafeTransferFrom { .. } => "safe_transfer_from",
            Self::SetApprovalForAll { .. } => "set_approval_for_all",
            Self::Relay(_) => "relay",
        }
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Privileged entry points.
///
/// Each capability is also a ledger token id: holding a non-zero balance of
/// `capability.id()` lets an account call that entry point directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Signed execution. Its id is the membership (voting weight) id.
    Execute,
    /// Direct dispatch of one operation.
    Relay,
    /// Direct dispatch of a batch of operations.
    Multirelay,
    /// Grant balances.
    Mint,
    /// Revoke other holders' balances.
    Burn,
    /// Update quorum.
    SetQuorum,
    /// Toggle transferability.
    SetTransferability,
    /// Set metadata.
    SetUri,
}

impl Capability {
    /// Canonical signature the capability id is derived from.
    #[must_use]
    pub const fn signature(self) -> &'static str {
        match self {
            Self::Execute => "execute(uint8,address,uint256,bytes,(uint8,bytes32,bytes32)[])",
            Self::Relay => "relay((uint8,address,uint256,bytes))",
            Self::Multirelay => "multirelay((uint8,address,uint256,bytes)[])",
            Self::Mint => "mint(address,uint256,uint256,bytes)",
            Self::Burn => "burn(address,uint256,uint256)",
            Self::SetQuorum => "setQuorum(uint256)",
            Self::SetTransferability => "setTransferability(uint256,bool)",
            Self::SetUri => "setURI(uint256,string)",
        }
    }

    /// Ledger token id for this capability (its 4-byte selector).
    #[must_use]
    pub fn id(self) -> TokenId {
        TokenId::from(u32::from_be_bytes(selector(self.signature())))
    }
}

/// Token id whose balance is membership (voting) weight.
#[must_use]
pub fn execution_id() -> TokenId {
    Capability::Execute.id()
}

// =============================================================================
// UNIT STATE
// =============================================================================

/// Mutable state owned by a unit, outside the ledger and the runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepState {
    /// The unit's own address.
    pub unit: Address,
    /// Signatures required per execution. Zero until initialized.
    pub quorum: u64,
    /// Replay counter.
    pub nonce: u64,
    /// Separator cached at initialization.
    pub separator: Option<DomainSeparator>,
    /// Per-id metadata set on the unit.
    pub uris: HashMap<TokenId, String>,
}

impl KeepState {
    /// Fresh, uninitialized state for `unit`.
    #[must_use]
    pub fn new(unit: Address) -> Self {
        Self {
            unit,
            quorum: 0,
            nonce: 0,
            separator: None,
            uris: HashMap::new(),
        }
    }

    /// Returns true once a quorum is installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.quorum != 0
    }
}

// =============================================================================
// CONSTANTS
// =============================================================================

/// Typed-data scheme name.
pub const SCHEME_NAME: &str = "Keep";

/// Typed-data scheme version.
pub const SCHEME_VERSION: &str = "1";

/// Marker a contract signer returns to accept a signature
/// (`isValidSignature(bytes32,bytes)` selector).
pub const VALID_SIGNATURE_MAGIC: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];

/// Acknowledgement for a single token-transfer notification.
pub const ON_RECEIVED_MAGIC: [u8; 4] = [0xf2, 0x3a, 0x6e, 0x61];

/// Acknowledgement for a batched token-transfer notification.
pub const ON_BATCH_RECEIVED_MAGIC: [u8; 4] = [0xbc, 0x19, 0x7c, 0x81];

// =============================================================================
// TESTS
// =============================================================================
