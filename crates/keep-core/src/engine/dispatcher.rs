//! # Execution Dispatcher
//!
//! Runs operations against the runtime and advances the replay counter.
//! Signed execution, relay, batched relay and multicall all converge here.

use super::Keep;
use crate::domain::entities::{Capability, KeepCall, Operation, OperationKind};
use crate::errors::KeepError;
use crate::events::KeepEvent;
use crate::ports::outbound::{ExecutionRuntime, MembershipLedger};
use keep_signature::Signature;
use keep_types::Address;
use tracing::{debug, warn};

impl<L: MembershipLedger, R: ExecutionRuntime> Keep<L, R> {
    // =========================================================================
    // ENTRY POINTS
    // =========================================================================

    /// Executes `operation` approved by a quorum of `signatures`.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` before `initialize`
    /// - `InvalidSignature` when the set is rejected
    /// - `ExecutionFailed` when the operation fails
    pub fn execute(&mut self, operation: Operation, signatures: &[Signature]) -> Result<(), KeepError> {
        if !self.state.is_initialized() {
            return Err(KeepError::NotInitialized);
        }
        self.atomic(|keep| {
            keep.verify(&operation, signatures)?;
            keep.dispatch(&operation)
        })
    }

    /// Dispatches one operation for a caller holding the relay capability.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` or `ExecutionFailed`.
    pub fn relay(&mut self, caller: Address, operation: Operation) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::Relay)?;
            keep.dispatch(&operation)
        })
    }

    /// Dispatches several operations in order. Any failure aborts them all.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` or the first `ExecutionFailed`.
    pub fn multirelay(&mut self, caller: Address, operations: Vec<Operation>) -> Result<(), KeepError> {
        self.atomic(|keep| {
            keep.require(caller, Capability::Multirelay)?;
            for operation in &operations {
                keep.dispatch(operation)?;
            }
            Ok(())
        })
    }

    /// Runs several unit entry points as `caller`. Any failure aborts them all.
    ///
    /// # Errors
    ///
    /// The first error any call returns.
    pub fn multicall(&mut self, caller: Address, calls: Vec<KeepCall>) -> Result<(), KeepError> {
        self.atomic(|keep| {
            for call in calls {
                keep.apply(caller, call)?;
            }
            Ok(())
        })
    }

    /// Routes one entry-point call.
    pub(crate) fn apply(&mut self, caller: Address, call: KeepCall) -> Result<(), KeepError> {
        match call {
            KeepCall::Mint { to, id, amount } => self.mint(caller, to, id, amount),
            KeepCall::Burn { from, id, amount } => self.burn(caller, from, id, amount),
            KeepCall::SetQuorum { threshold } => self.set_quorum(caller, threshold),
            KeepCall::SetTransferability { id, on } => self.set_transferability(caller, id, on),
            KeepCall::SetUri { id, uri } => self.set_uri(caller, id, uri),
            KeepCall::SafeTransferFrom {
                from,
                to,
                id,
                amount,
            } => self.safe_transfer_from(caller, from, to, id, amount),
            KeepCall::SetApprovalForAll { operator, approved } => {
                self.set_approval_for_all(caller, operator, approved)
            }
            KeepCall::Relay(operation) => self.relay(caller, operation),
        }
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Advances the nonce and runs one operation.
    pub(crate) fn dispatch(&mut self, operation: &Operation) -> Result<(), KeepError> {
        self.state.nonce = self
            .state
            .nonce
            .checked_add(1)
            .ok_or_else(|| KeepError::ExecutionFailed("nonce exhausted".to_string()))?;

        let unit = self.state.unit;
        debug!(kind = %operation.kind, to = %operation.to, nonce = self.state.nonce, "Dispatching operation");

        match operation.kind {
            OperationKind::Call => {
                if operation.to == unit {
                    self.self_call(operation)?;
                } else {
                    self.runtime.call(
                        unit,
                        operation.to,
                        operation.value,
                        operation.data.as_slice(),
                    )?;
                }
                self.emit_executed(operation);
            }
            OperationKind::DelegateCall => {
                if !operation.value.is_zero() {
                    return Err(KeepError::ExecutionFailed(
                        "delegate call cannot forward value".to_string(),
                    ));
                }
                self.runtime
                    .delegate_call(unit, operation.to, operation.data.as_slice())?;
                self.emit_executed(operation);
            }
            OperationKind::Create => {
                let created = self
                    .runtime
                    .create(unit, operation.value, operation.data.as_slice())?;
                self.emit_created(operation, created)?;
            }
            OperationKind::Create2 => {
                let (salt, code) = operation.create2_parts().ok_or_else(|| {
                    KeepError::ExecutionFailed("create2 payload shorter than salt".to_string())
                })?;
                let created = self.runtime.create2(unit, operation.value, salt, code)?;
                self.emit_created(operation, created)?;
            }
        }
        Ok(())
    }

    /// A call the unit makes on itself: decode and run the entry point with
    /// the unit as caller.
    fn self_call(&mut self, operation: &Operation) -> Result<(), KeepError> {
        let call = KeepCall::from_payload(operation.data.as_slice())
            .map_err(|e| KeepError::ExecutionFailed(format!("undecodable self-call: {e}")))?;
        let name = call.name();
        let unit = self.state.unit;
        self.apply(unit, call).map_err(|err| {
            warn!(call = name, error = %err, "Self-call failed");
            KeepError::ExecutionFailed(format!("{name}: {err}"))
        })
    }

    fn emit_executed(&mut self, operation: &Operation) {
        self.emit(KeepEvent::Executed {
            kind: operation.kind,
            to: operation.to,
            value: operation.value,
            data: operation.data.clone(),
        });
    }

    fn emit_created(&mut self, operation: &Operation, created: Address) -> Result<(), KeepError> {
        if created.is_zero() {
            return Err(KeepError::ExecutionFailed(format!(
                "{} returned the zero address",
                operation.kind
            )));
        }
        self.emit(KeepEvent::ContractCreated {
            kind: operation.kind,
            creation: created,
            value: operation.value,
        });
        Ok(())
    }
}
