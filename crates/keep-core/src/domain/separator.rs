//! # Domain Separator
//!
//! Binds signed messages to one unit on one chain. The value is computed once
//! at initialization and reused while the live chain id matches; after a fork
//! that changes the chain id it is recomputed on every use.

use super::entities::{SCHEME_NAME, SCHEME_VERSION};
use keep_types::{abi, keccak256, Address, Hash, Token, U256};
use serde::{Deserialize, Serialize};

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")`
#[must_use]
pub fn domain_typehash() -> Hash {
    keccak256(b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
}

/// Separator for `unit` on `chain_id`.
#[must_use]
pub fn compute_separator(chain_id: u64, unit: Address) -> Hash {
    let encoded = abi::encode(&[
        Token::FixedBytes(domain_typehash()),
        Token::FixedBytes(keccak256(SCHEME_NAME.as_bytes())),
        Token::FixedBytes(keccak256(SCHEME_VERSION.as_bytes())),
        Token::Uint(U256::from(chain_id)),
        Token::Address(unit),
    ]);
    keccak256(&encoded)
}

/// Separator cached at initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSeparator {
    chain_id: u64,
    unit: Address,
    cached: Hash,
}

impl DomainSeparator {
    /// Computes and caches the separator for `unit` on `chain_id`.
    #[must_use]
    pub fn new(chain_id: u64, unit: Address) -> Self {
        Self {
            chain_id,
            unit,
            cached: compute_separator(chain_id, unit),
        }
    }

    /// Chain id captured at initialization.
    #[must_use]
    pub fn initial_chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Separator to sign against when the live chain id is `chain_id_now`.
    #[must_use]
    pub fn current(&self, chain_id_now: u64) -> Hash {
        if chain_id_now == self.chain_id {
            self.cached
        } else {
            compute_separator(chain_id_now, self.unit)
        }
    }
}
