//! # Keep Signature
//!
//! Recoverable ECDSA (secp256k1) signatures used to approve Keep operations.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure cryptographic logic, no I/O
//!
//! ## Security Notes
//!
//! - **Malleability Prevention (EIP-2)**: signatures with high S values are rejected
//! - **Scalar Range Validation**: R and S must be in [1, n-1]
//! - Signer identity is always the recovered address; callers compare it
//!   against membership, never against a claimed identity

pub mod domain;

// Re-export public API
pub use domain::ecdsa::{address_from_pubkey, invert_s, recover_address, sign_digest};
pub use domain::entities::Signature;
pub use domain::errors::SignatureError;
pub use k256::ecdsa::SigningKey;
