//! # Keep Service
//!
//! Thread-safe handle around one `Keep` engine.
//!
//! - Serializes entry points behind a mutex
//! - Refuses same-thread re-entry with `KeepError::Reentrancy`
//! - Tags every entry point with a correlation id in its tracing span
//! - Publishes events only after the entry point commits
//! - Maintains execution statistics

use crate::adapters::{InMemoryEventBus, InMemoryLedger, InMemoryRuntime};
use crate::domain::entities::{KeepCall, Operation};
use crate::engine::Keep;
use crate::errors::KeepError;
use crate::events::KeepEventEnvelope;
use crate::ports::inbound::KeepApi;
use crate::ports::outbound::{EventPublisher, ExecutionRuntime, MembershipLedger};
use crate::reentrancy::ReentrancyGuard;
use keep_signature::Signature;
use keep_types::{Address, Hash, TokenId, U256};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, instrument, warn};
use uuid::Uuid;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Capacity of the in-memory event bus built by `KeepService::in_memory`.
    pub event_bus_capacity: usize,
    /// Publish committed events.
    pub publish_events: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: crate::adapters::DEFAULT_CHANNEL_CAPACITY,
            publish_events: true,
        }
    }
}

/// Statistics for the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Entry points invoked (views excluded).
    pub entry_points: u64,
    /// Entry points that committed.
    pub committed: u64,
    /// Entry points that rolled back.
    pub rolled_back: u64,
    /// Rollbacks caused by a rejected signature set.
    pub signature_rejections: u64,
    /// Calls refused as re-entrant.
    pub reentrancy_rejections: u64,
    /// Operations dispatched by committed entry points.
    pub operations_dispatched: u64,
    /// Events handed to the publisher.
    pub events_published: u64,
    /// Average entry-point latency in microseconds.
    pub avg_latency_us: u64,
}

/// Shared handle to a running unit.
pub struct KeepService<L: MembershipLedger, R: ExecutionRuntime> {
    config: ServiceConfig,
    unit: Address,
    engine: Arc<Mutex<Keep<L, R>>>,
    guard: Arc<ReentrancyGuard>,
    publisher: Arc<dyn EventPublisher>,
    stats: Arc<Mutex<ServiceStats>>,
}

impl<L: MembershipLedger, R: ExecutionRuntime> Clone for KeepService<L, R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            unit: self.unit,
            engine: Arc::clone(&self.engine),
            guard: Arc::clone(&self.guard),
            publisher: Arc::clone(&self.publisher),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<L: MembershipLedger, R: ExecutionRuntime> KeepService<L, R> {
    /// Wraps `keep`, publishing through `publisher`.
    pub fn new(keep: Keep<L, R>, publisher: Arc<dyn EventPublisher>, config: ServiceConfig) -> Self {
        let unit = keep.address();
        info!(%unit, "Keep service created");
        Self {
            config,
            unit,
            engine: Arc::new(Mutex::new(keep)),
            guard: Arc::new(ReentrancyGuard::new()),
            publisher,
            stats: Arc::new(Mutex::new(ServiceStats::default())),
        }
    }

    /// Wraps `keep` with a fresh in-memory event bus, returned for subscribing.
    pub fn in_memory(keep: Keep<L, R>, config: ServiceConfig) -> (Self, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus_capacity));
        let publisher: Arc<dyn EventPublisher> = Arc::clone(&bus) as Arc<dyn EventPublisher>;
        (Self::new(keep, publisher, config), bus)
    }

    /// The unit's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.unit
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().clone()
    }

    /// Runs `f` against the engine outside any atomic step. Meant for
    /// environment setup and inspection.
    ///
    /// # Errors
    ///
    /// `Reentrancy` when called from inside an entry point.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut Keep<L, R>) -> T) -> Result<T, KeepError> {
        self.guard.check()?;
        let mut engine = self.engine.lock();
        let _held = self.guard.hold();
        Ok(f(&mut *engine))
    }

    // =========================================================================
    // ENTRY POINT EXECUTION
    // =========================================================================

    fn run(
        &self,
        operation: &'static str,
        step: impl FnOnce(&mut Keep<L, R>) -> Result<(), KeepError>,
    ) -> Result<(), KeepError> {
        if let Err(err) = self.guard.check() {
            warn!(operation, unit = %self.unit, "Re-entrant call rejected");
            self.stats.lock().reentrancy_rejections += 1;
            return Err(err);
        }

        let correlation_id = Uuid::new_v4();
        let span = info_span!("keep_entry_point", operation, unit = %self.unit, %correlation_id);
        let _entered = span.enter();
        let started = Instant::now();

        let (result, dispatched, events) = {
            let mut engine = self.engine.lock();
            let _held = self.guard.hold();
            let nonce_before = engine.nonce();
            let result = step(&mut *engine);
            let dispatched = engine.nonce().saturating_sub(nonce_before);
            (result, dispatched, engine.drain_events())
        };

        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        let mut published = 0u64;
        if result.is_ok() && self.config.publish_events {
            for event in events {
                self.publisher.publish(KeepEventEnvelope {
                    unit: self.unit,
                    correlation_id,
                    event,
                });
                published += 1;
            }
        }

        let mut stats = self.stats.lock();
        stats.entry_points += 1;
        stats.avg_latency_us = if stats.entry_points == 1 {
            elapsed_us
        } else {
            (stats.avg_latency_us * (stats.entry_points - 1) + elapsed_us) / stats.entry_points
        };
        match &result {
            Ok(()) => {
                stats.committed += 1;
                stats.operations_dispatched += dispatched;
                stats.events_published += published;
                debug!(dispatched, elapsed_us, "Entry point committed");
            }
            Err(err) => {
                stats.rolled_back += 1;
                if err.is_signature_rejection() {
                    stats.signature_rejections += 1;
                }
                warn!(error = %err, elapsed_us, "Entry point rolled back");
            }
        }
        result
    }

    fn view<T>(&self, read: impl FnOnce(&Keep<L, R>) -> T) -> Result<T, KeepError> {
        self.guard.check()?;
        let engine = self.engine.lock();
        Ok(read(&*engine))
    }
}

impl<L: MembershipLedger, R: ExecutionRuntime> KeepApi for KeepService<L, R> {
    #[instrument(skip_all, fields(signers = signers.len(), threshold = threshold))]
    fn initialize(
        &self,
        calls: Vec<Operation>,
        signers: Vec<Address>,
        threshold: u64,
    ) -> Result<(), KeepError> {
        self.run("initialize", |keep| keep.initialize(&calls, &signers, threshold))
    }

    #[instrument(skip_all, fields(kind = %operation.kind, to = %operation.to, signatures = signatures.len()))]
    fn execute(&self, operation: Operation, signatures: Vec<Signature>) -> Result<(), KeepError> {
        self.run("execute", |keep| keep.execute(operation, &signatures))
    }

    #[instrument(skip_all, fields(caller = %caller, kind = %operation.kind))]
    fn relay(&self, caller: Address, operation: Operation) -> Result<(), KeepError> {
        self.run("relay", |keep| keep.relay(caller, operation))
    }

    #[instrument(skip_all, fields(caller = %caller, operations = operations.len()))]
    fn multirelay(&self, caller: Address, operations: Vec<Operation>) -> Result<(), KeepError> {
        self.run("multirelay", |keep| keep.multirelay(caller, operations))
    }

    #[instrument(skip_all, fields(caller = %caller, calls = calls.len()))]
    fn multicall(&self, caller: Address, calls: Vec<KeepCall>) -> Result<(), KeepError> {
        self.run("multicall", |keep| keep.multicall(caller, calls))
    }

    #[instrument(skip_all, fields(caller = %caller, call = call.name()))]
    fn call(&self, caller: Address, call: KeepCall) -> Result<(), KeepError> {
        self.run(call.name(), |keep| keep.apply(caller, call))
    }

    fn quorum(&self) -> Result<u64, KeepError> {
        self.view(Keep::quorum)
    }

    fn nonce(&self) -> Result<u64, KeepError> {
        self.view(Keep::nonce)
    }

    fn digest(&self, operation: &Operation) -> Result<Hash, KeepError> {
        self.view(|keep| keep.digest(operation))
    }

    fn domain_separator(&self) -> Result<Hash, KeepError> {
        self.view(Keep::domain_separator)
    }

    fn balance_of(&self, account: Address, id: TokenId) -> Result<U256, KeepError> {
        self.view(|keep| keep.balance_of(account, id))
    }

    fn total_supply(&self, id: TokenId) -> Result<U256, KeepError> {
        self.view(|keep| keep.total_supply(id))
    }

    fn uri(&self, id: TokenId) -> Result<String, KeepError> {
        self.view(|keep| keep.uri(id))
    }
}

/// Service over in-memory adapters, with its event bus.
#[must_use]
pub fn create_in_memory_service(
    unit: Address,
    chain_id: u64,
) -> (KeepService<InMemoryLedger, InMemoryRuntime>, Arc<InMemoryEventBus>) {
    let keep = Keep::new(unit, InMemoryLedger::new(), InMemoryRuntime::new(chain_id));
    KeepService::in_memory(keep, ServiceConfig::default())
}

// =============================================================================
// TESTS
// =============================================================================
