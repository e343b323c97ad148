//! # Signed Digest
//!
//! Typed-data hashing of an operation at a given nonce:
//!
//! ```text
//! digest = keccak256(0x19 0x01 || separator || structHash)
//! structHash = keccak256(abi.encode(EXECUTE_TYPEHASH, op, to, value, keccak256(data), nonce))
//! ```

use super::entities::Operation;
use keep_types::{abi, keccak256, Hash, Token, U256};

/// `keccak256("Execute(uint8 op,address to,uint256 value,bytes data,uint120 nonce)")`
#[must_use]
pub fn execute_typehash() -> Hash {
    keccak256(b"Execute(uint8 op,address to,uint256 value,bytes data,uint120 nonce)")
}

/// Struct hash of `operation` at `nonce`.
#[must_use]
pub fn struct_hash(operation: &Operation, nonce: u64) -> Hash {
    let encoded = abi::encode(&[
        Token::FixedBytes(execute_typehash()),
        Token::Uint(U256::from(operation.kind.as_u8())),
        Token::Address(operation.to),
        Token::Uint(operation.value),
        Token::FixedBytes(keccak256(operation.data.as_slice())),
        Token::from(nonce),
    ]);
    keccak256(&encoded)
}

/// Digest the quorum signs for `operation` at `nonce` under `separator`.
#[must_use]
pub fn execute_digest(separator: &Hash, operation: &Operation, nonce: u64) -> Hash {
    let mut preimage = Vec::with_capacity(66);
    preimage.extend_from_slice(&[0x19, 0x01]);
    preimage.extend_from_slice(separator.as_bytes());
    preimage.extend_from_slice(struct_hash(operation, nonce).as_bytes());
    keccak256(&preimage)
}
