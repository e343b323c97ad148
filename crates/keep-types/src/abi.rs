//! # ABI Word Encoding
//!
//! The subset of the Ethereum contract ABI needed to build typed-data digests:
//! static 32-byte words, keccak-256, function selectors, and the
//! `CREATE`/`CREATE2` address derivations.
//!
//! Pure functions only. No I/O, no allocation beyond the output buffer.

use crate::primitives::{Address, Hash, U256};
use sha3::{Digest, Keccak256};

// =============================================================================
// KECCAK256
// =============================================================================

/// Computes keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let hash = Keccak256::digest(data);
    Hash::new(hash.into())
}

/// First four bytes of `keccak256(signature)`.
///
/// `signature` is the canonical function signature, e.g. `"setQuorum(uint256)"`.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash.0[..4]);
    out
}

// =============================================================================
// STATIC WORDS
// =============================================================================

/// A static ABI value, encoded as exactly one 32-byte word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// `address`, left-padded with zeros.
    Address(Address),
    /// Any `uintN`, big-endian and left-padded.
    Uint(U256),
    /// `bytes32`, including pre-hashed dynamic values.
    FixedBytes(Hash),
}

impl Token {
    /// Encodes this token as a single 32-byte word.
    #[must_use]
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Self::Address(addr) => word[12..].copy_from_slice(addr.as_bytes()),
            Self::Uint(value) => value.to_big_endian(&mut word),
            Self::FixedBytes(hash) => word.copy_from_slice(hash.as_bytes()),
        }
        word
    }
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

/// `abi.encode` of a tuple of static tokens.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.len() * 32);
    for token in tokens {
        out.extend_from_slice(&token.to_word());
    }
    out
}

// =============================================================================
// CONTRACT ADDRESS COMPUTATION
// =============================================================================

/// Computes the contract address for CREATE.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12:\]
#[must_use]
pub fn compute_contract_address(sender: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // RLP encode address (20 bytes, 0x80 + 20 = 0x94)
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    // RLP encode nonce
    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 128 {
        content.push(nonce as u8);
    } else {
        let nonce_bytes = strip_leading_zeros(nonce);
        content.push(0x80 + nonce_bytes.len() as u8);
        content.extend_from_slice(&nonce_bytes);
    }

    // A 20-byte address plus at most 9 nonce bytes always fits a short list
    let mut rlp_data = Vec::with_capacity(content.len() + 1);
    rlp_data.push(0xc0 + content.len() as u8);
    rlp_data.extend_from_slice(&content);

    let hash = keccak256(&rlp_data);
    Address::from_slice(&hash.0[12..]).unwrap_or_default()
}

/// Computes the contract address for CREATE2.
///
/// Address = keccak256(0xff ++ sender ++ salt ++ `keccak256(init_code)`)\[12:\]
#[must_use]
pub fn compute_contract_address_create2(sender: Address, salt: Hash, init_code: &[u8]) -> Address {
    let code_hash = keccak256(init_code);

    let mut data = Vec::with_capacity(85);
    data.push(0xff);
    data.extend_from_slice(sender.as_bytes());
    data.extend_from_slice(salt.as_bytes());
    data.extend_from_slice(code_hash.as_bytes());

    let hash = keccak256(&data);
    Address::from_slice(&hash.0[12..]).unwrap_or_default()
}

fn strip_leading_zeros(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    bytes[start..].to_vec()
}

// =============================================================================
// TESTS
// =============================================================================
