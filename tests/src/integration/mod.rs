//! # Integration Flows
//!
//! End-to-end behavior of a unit driven through `KeepService`.

pub mod administration;
pub mod atomicity;
pub mod execution;
pub mod reentrancy;
