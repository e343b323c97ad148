//! # Adapters
//!
//! In-memory implementations of the outbound ports.

pub mod event_bus;
pub mod ledger;
pub mod metadata;
pub mod runtime;

pub use event_bus::{InMemoryEventBus, Subscription, SubscriptionError, DEFAULT_CHANNEL_CAPACITY};
pub use ledger::InMemoryLedger;
pub use metadata::StaticMetadata;
pub use runtime::{CallRecord, InMemoryRuntime};
