//! # Authorization Engine
//!
//! The `Keep` aggregate: one unit's state plus its ledger and runtime ports.
//!
//! The engine is synchronous and takes `&mut self` on every mutating entry
//! point. Each entry point is one atomic step: a checkpoint of the unit
//! state, the event journal, the ledger and the runtime is taken first and
//! restored if the step fails.
//!
//! Submodules split the entry points by concern:
//! - `verifier`: signed digest and signature-set validation
//! - `dispatcher`: execution primitives, relay and batching
//! - `guard`: membership, quorum and the other capability-gated entry points
//! - `init`: one-time setup

mod dispatcher;
mod guard;
mod init;
mod verifier;

use crate::domain::entities::{KeepState, ON_BATCH_RECEIVED_MAGIC, ON_RECEIVED_MAGIC};
use crate::domain::separator::compute_separator;
use crate::errors::KeepError;
use crate::events::KeepEvent;
use crate::ports::outbound::{ExecutionRuntime, Journaled, MembershipLedger, MetadataSource};
use keep_types::{Address, Hash, TokenId, U256};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// AGGREGATE
// =============================================================================

/// A group-custody authorization unit.
pub struct Keep<L: MembershipLedger, R: ExecutionRuntime> {
    state: KeepState,
    ledger: L,
    runtime: R,
    metadata: Option<Arc<dyn MetadataSource>>,
    events: Vec<KeepEvent>,
}

/// Checkpoint of a whole unit.
pub struct KeepSnapshot<L, R> {
    state: KeepState,
    events: usize,
    ledger: L,
    runtime: R,
}

impl<L: MembershipLedger, R: ExecutionRuntime> Keep<L, R> {
    /// Creates an uninitialized unit at `unit`.
    pub fn new(unit: Address, ledger: L, runtime: R) -> Self {
        Self {
            state: KeepState::new(unit),
            ledger,
            runtime,
            metadata: None,
            events: Vec::new(),
        }
    }

    /// Sets the fallback metadata source consulted by `uri`.
    #[must_use]
    pub fn with_metadata(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(source);
        self
    }

    /// Runs `step` as one atomic step.
    pub(crate) fn atomic<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, KeepError>,
    ) -> Result<T, KeepError> {
        let checkpoint = self.snapshot();
        match step(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.restore(checkpoint);
                Err(err)
            }
        }
    }

    pub(crate) fn emit(&mut self, event: KeepEvent) {
        self.events.push(event);
    }

    /// Takes every event committed since the last drain.
    pub fn drain_events(&mut self) -> Vec<KeepEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // VIEWS
    // =========================================================================

    /// The unit's own address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.state.unit
    }

    /// Signatures required per execution. Zero until initialized.
    #[must_use]
    pub fn quorum(&self) -> u64 {
        self.state.quorum
    }

    /// Replay counter.
    #[must_use]
    pub fn nonce(&self) -> u64 {
        self.state.nonce
    }

    /// Whether `initialize` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    /// Full unit state.
    #[must_use]
    pub fn state(&self) -> &KeepState {
        &self.state
    }

    /// Balance of `account` under `id`.
    #[must_use]
    pub fn balance_of(&self, account: Address, id: TokenId) -> U256 {
        self.ledger.balance_of(account, id)
    }

    /// Total supply of `id`.
    #[must_use]
    pub fn total_supply(&self, id: TokenId) -> U256 {
        self.ledger.total_supply(id)
    }

    /// Separator for the live chain id.
    #[must_use]
    pub fn domain_separator(&self) -> Hash {
        let chain_id = self.runtime.chain_id();
        match &self.state.separator {
            Some(cached) => cached.current(chain_id),
            None => compute_separator(chain_id, self.state.unit),
        }
    }

    /// Metadata URI: the unit's own value, else the fallback source, else
    /// an empty string.
    #[must_use]
    pub fn uri(&self, id: TokenId) -> String {
        self.state
            .uris
            .get(&id)
            .cloned()
            .or_else(|| self.metadata.as_ref().and_then(|source| source.uri(id)))
            .unwrap_or_default()
    }

    /// Events journaled and not yet drained.
    #[must_use]
    pub fn pending_events(&self) -> &[KeepEvent] {
        &self.events
    }

    /// Ledger port.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Runtime port.
    #[must_use]
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Mutable runtime access for environment setup (funding, forks).
    /// Changes made here are outside any atomic step.
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    // =========================================================================
    // RECEIVER HOOKS
    // =========================================================================

    /// Accepts a single incoming token transfer.
    #[must_use]
    pub fn on_erc1155_received(
        &self,
        _operator: Address,
        _from: Address,
        _id: TokenId,
        _amount: U256,
        _data: &[u8],
    ) -> [u8; 4] {
        ON_RECEIVED_MAGIC
    }

    /// Accepts a batched incoming token transfer.
    #[must_use]
    pub fn on_erc1155_batch_received(
        &self,
        _operator: Address,
        _from: Address,
        _ids: &[TokenId],
        _amounts: &[U256],
        _data: &[u8],
    ) -> [u8; 4] {
        ON_BATCH_RECEIVED_MAGIC
    }
}

impl<L: MembershipLedger, R: ExecutionRuntime> Journaled for Keep<L, R> {
    type Snapshot = KeepSnapshot<L::Snapshot, R::Snapshot>;

    fn snapshot(&self) -> Self::Snapshot {
        KeepSnapshot {
            state: self.state.clone(),
            events: self.events.len(),
            ledger: self.ledger.snapshot(),
            runtime: self.runtime.snapshot(),
        }
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        self.state = snapshot.state;
        self.events.truncate(snapshot.events);
        self.ledger.restore(snapshot.ledger);
        self.runtime.restore(snapshot.runtime);
    }
}

impl<L: MembershipLedger, R: ExecutionRuntime> fmt::Debug for Keep<L, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keep")
            .field("unit", &self.state.unit)
            .field("quorum", &self.state.quorum)
            .field("nonce", &self.state.nonce)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TEST SUPPORT
// =============================================================================
