//! # Keep Types
//!
//! Primitive value types shared across the Keep workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every crate uses the same `Address`, `Hash`
//!   and `Bytes` definitions.
//! - **Canonical Ordering**: `Address` orders bytewise, which is the ordering
//!   used for signer lists, signature sets and redemption asset lists.
//! - **Pure**: no I/O, no async, no global state.

pub mod abi;
pub mod primitives;

pub use abi::{
    compute_contract_address, compute_contract_address_create2, encode, keccak256, selector,
    Token,
};
pub use primitives::{Address, Bytes, Hash, TokenId, U256, U512};
