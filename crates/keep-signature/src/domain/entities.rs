//! # Domain Entities
//!
//! Core data structures for signature recovery.

use serde::{Deserialize, Serialize};

/// Recoverable ECDSA signature on the secp256k1 curve.
///
/// A Keep signature set is a list of these triples; the signer of each entry
/// is whatever address recovers from the signed digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Recovery ID (0, 1, 27, or 28)
    pub v: u8,
    /// R component (32 bytes)
    pub r: [u8; 32],
    /// S component (32 bytes)
    pub s: [u8; 32],
}

impl Signature {
    /// Creates a new signature.
    #[must_use]
    pub const fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// Packed `r || s || v` encoding (65 bytes).
    ///
    /// This is the byte form handed to a contract signer's delegated
    /// validation callback.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// Parses the packed `r || s || v` encoding.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 65 {
            return None;
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Some(Self { v: bytes[64], r, s })
    }
}
