//! # Domain Layer
//!
//! Pure authorization logic: entities, typed-data hashing and invariants.
//! Nothing here touches the ledger or the runtime.

pub mod digest;
pub mod entities;
pub mod invariants;
pub mod separator;

pub use digest::{execute_digest, execute_typehash, struct_hash};
pub use entities::{
    execution_id, Capability, KeepCall, KeepState, Operation, OperationKind,
    ON_BATCH_RECEIVED_MAGIC, ON_RECEIVED_MAGIC, SCHEME_NAME, SCHEME_VERSION,
    VALID_SIGNATURE_MAGIC,
};
pub use separator::{compute_separator, domain_typehash, DomainSeparator};
