//! # Keep Core - Group-Custody Authorization Engine
//!
//! A shared account whose control rights are balances in a multi-identifier
//! ledger. Privileged operations need a quorum of signatures over a
//! domain-separated, replay-protected digest.
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Domain separator | `domain/separator.rs` | Chain- and unit-bound hashing context |
//! | Signed digest | `domain/digest.rs` | Typed-data hash of an operation at a nonce |
//! | Verifier | `engine/verifier.rs` | Ordered signature-set validation |
//! | Dispatcher | `engine/dispatcher.rs` | Call, delegate call, create, create2 |
//! | Guard | `engine/guard.rs` | Capabilities, membership and quorum bounds |
//! | Initialization | `engine/init.rs` | One-time setup |
//! | Service | `service.rs` | Locking, re-entrancy refusal, event publication |
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | `0 < quorum <= total weight` | `domain/invariants.rs` - `enforce_threshold()`, `enforce_within_supply()` |
//! | Strictly ascending signers | `domain/invariants.rs` - `enforce_ordering()` |
//! | One nonce step per dispatch | `engine/dispatcher.rs` - `dispatch()` |
//! | All-or-nothing entry points | `engine/mod.rs` - `Keep::atomic()` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use keep_core::prelude::*;
//!
//! let (service, bus) = create_in_memory_service(unit, 1);
//! service.initialize(vec![], sorted_signers, 2)?;
//!
//! let op = Operation::call(target, U256::zero(), payload);
//! let digest = service.digest(&op)?;
//! // ...collect quorum signatures over `digest`, ascending by signer...
//! service.execute(op, signatures)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ports;
pub mod reentrancy;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Primitives
    pub use keep_types::{Address, Bytes, Hash, TokenId, U256};

    // Signatures
    pub use keep_signature::{sign_digest, Signature, SigningKey};

    // Domain
    pub use crate::domain::entities::{
        execution_id, Capability, KeepCall, KeepState, Operation, OperationKind,
    };
    pub use crate::domain::{compute_separator, execute_digest, DomainSeparator};

    // Engine
    pub use crate::engine::Keep;

    // Ports
    pub use crate::ports::inbound::KeepApi;
    pub use crate::ports::outbound::{
        EventPublisher, ExecutionRuntime, Journaled, MembershipLedger, MetadataSource,
    };

    // Events
    pub use crate::events::{EventFilter, EventTopic, KeepEvent, KeepEventEnvelope};

    // Errors
    pub use crate::errors::{KeepError, LedgerError, RuntimeError, SignatureRejection};

    // Adapters
    pub use crate::adapters::{InMemoryEventBus, InMemoryLedger, InMemoryRuntime, StaticMetadata};

    // Service
    pub use crate::service::{create_in_memory_service, KeepService, ServiceConfig, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Component name used in logs.
pub const COMPONENT_NAME: &str = "keep-core";
