//! # Ports
//!
//! Hexagonal boundaries of the engine.

pub mod inbound;
pub mod outbound;

pub use inbound::KeepApi;
pub use outbound::{EventPublisher, ExecutionRuntime, Journaled, MembershipLedger, MetadataSource};
