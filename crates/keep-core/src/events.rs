//! # Event Schema
//!
//! Events emitted by a unit. They are journaled while an entry point runs,
//! dropped if it fails, and published only after it commits.

use crate::domain::entities::OperationKind;
use keep_types::{Address, Bytes, TokenId, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// EVENTS
// =============================================================================

/// Everything a unit can emit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeepEvent {
    // =========================================================================
    // EXECUTION
    // =========================================================================
    /// A call or delegate call was dispatched.
    Executed {
        /// Execution primitive.
        kind: OperationKind,
        /// Target.
        to: Address,
        /// Value forwarded.
        value: U256,
        /// Payload.
        data: Bytes,
    },

    /// A contract was created.
    ContractCreated {
        /// `Create` or `Create2`.
        kind: OperationKind,
        /// Address of the new contract.
        creation: Address,
        /// Value endowed.
        value: U256,
    },

    // =========================================================================
    // GOVERNANCE
    // =========================================================================
    /// Quorum threshold installed or changed.
    QuorumSet {
        /// Account that changed it (the unit itself for signed changes).
        caller: Address,
        /// New threshold.
        threshold: u64,
    },

    /// Transferability of an id toggled.
    TransferabilitySet {
        /// Account that changed it.
        operator: Address,
        /// Token id.
        id: TokenId,
        /// New setting.
        on: bool,
    },

    // =========================================================================
    // LEDGER
    // =========================================================================
    /// Balance moved, minted (`from` zero) or burned (`to` zero).
    TransferSingle {
        /// Account that initiated the movement.
        operator: Address,
        /// Debited account.
        from: Address,
        /// Credited account.
        to: Address,
        /// Token id.
        id: TokenId,
        /// Amount.
        amount: U256,
    },

    /// Operator approval changed.
    ApprovalForAll {
        /// Token owner.
        owner: Address,
        /// Operator.
        operator: Address,
        /// New setting.
        approved: bool,
    },

    // =========================================================================
    // METADATA
    // =========================================================================
    /// Metadata URI for an id changed.
    Uri {
        /// New URI.
        value: String,
        /// Token id.
        id: TokenId,
    },
}

impl KeepEvent {
    /// Topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Executed { .. } | Self::ContractCreated { .. } => EventTopic::Execution,
            Self::QuorumSet { .. } | Self::TransferabilitySet { .. } => EventTopic::Governance,
            Self::TransferSingle { .. } | Self::ApprovalForAll { .. } => EventTopic::Ledger,
            Self::Uri { .. } => EventTopic::Metadata,
        }
    }
}

/// Event categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Dispatch results.
    Execution,
    /// Quorum and transferability.
    Governance,
    /// Balances and approvals.
    Ledger,
    /// Metadata.
    Metadata,
    /// Matches every topic.
    All,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// A committed event as it travels on the bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepEventEnvelope {
    /// Emitting unit.
    pub unit: Address,
    /// Correlation id of the entry point that committed it.
    pub correlation_id: Uuid,
    /// The event.
    pub event: KeepEvent,
}

impl KeepEventEnvelope {
    /// JSON export for log shipping.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// FILTER
// =============================================================================

/// Subscription filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Units to include. Empty means all units.
    pub units: Vec<Address>,
}

impl EventFilter {
    /// Accepts everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accepts only `topics`.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            units: Vec::new(),
        }
    }

    /// Restricts the filter to one unit.
    #[must_use]
    pub fn for_unit(mut self, unit: Address) -> Self {
        self.units.push(unit);
        self
    }

    /// Whether `envelope` passes this filter.
    #[must_use]
    pub fn matches(&self, envelope: &KeepEventEnvelope) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&envelope.event.topic());

        let unit_match = self.units.is_empty() || self.units.contains(&envelope.unit);

        topic_match && unit_match
    }
}
