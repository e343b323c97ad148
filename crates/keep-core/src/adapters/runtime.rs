//! # In-Memory Execution Runtime
//!
//! A deterministic stand-in for the chain the unit lives on: native balances,
//! deployed code, creation nonces, and a log of every call it received.
//!
//! Behaviors used to model failure:
//! - Calls into an address marked reverting fail with `Reverted`
//! - Creation code starting with `0xfe` (INVALID) yields the zero address
//! - `Create2` onto an address that already has code yields the zero address
//! - Contract signers accept only digests explicitly approved for them

use crate::domain::entities::VALID_SIGNATURE_MAGIC;
use crate::errors::RuntimeError;
use crate::ports::outbound::{ExecutionRuntime, Journaled};
use keep_types::{compute_contract_address, compute_contract_address_create2, Address, Bytes, Hash, U256};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Opcode that aborts creation.
const INVALID_OPCODE: u8 = 0xfe;

/// One call observed by the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    /// Calling account (storage context for delegate calls).
    pub caller: Address,
    /// Account whose code ran.
    pub target: Address,
    /// Value forwarded.
    pub value: U256,
    /// Payload.
    pub data: Bytes,
    /// Ran in the caller's storage context.
    pub delegate: bool,
}

/// In-memory runtime.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRuntime {
    chain_id: u64,
    balances: HashMap<Address, U256>,
    code: HashMap<Address, Bytes>,
    nonces: HashMap<Address, u64>,
    reverting: HashSet<Address>,
    approved_digests: HashMap<Address, HashSet<Hash>>,
    calls: Vec<CallRecord>,
}

impl InMemoryRuntime {
    /// Creates a runtime on `chain_id`.
    #[must_use]
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Self::default()
        }
    }

    /// Simulates a fork to another chain id.
    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
    }

    /// Credits native balance.
    pub fn fund(&mut self, account: Address, amount: U256) {
        let entry = self.balances.entry(account).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Native balance of `account`.
    #[must_use]
    pub fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    /// Installs code at `account`.
    pub fn deploy_code(&mut self, account: Address, code: impl Into<Bytes>) {
        self.code.insert(account, code.into());
    }

    /// Code deployed at `account`.
    #[must_use]
    pub fn code_at(&self, account: Address) -> Option<&Bytes> {
        self.code.get(&account)
    }

    /// Creation nonce of `account`.
    #[must_use]
    pub fn nonce(&self, account: Address) -> u64 {
        self.nonces.get(&account).copied().unwrap_or_default()
    }

    /// Makes every call into `account` revert (or stop reverting).
    pub fn set_reverting(&mut self, account: Address, reverting: bool) {
        if reverting {
            self.reverting.insert(account);
        } else {
            self.reverting.remove(&account);
        }
    }

    /// Makes contract `signer` accept `digest` in delegated validation.
    pub fn approve_digest(&mut self, signer: Address, digest: Hash) {
        self.approved_digests.entry(signer).or_default().insert(digest);
    }

    /// Calls observed so far.
    #[must_use]
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    fn move_value(&mut self, from: Address, to: Address, value: U256) -> Result<(), RuntimeError> {
        if value.is_zero() {
            return Ok(());
        }
        let available = self.balance(from);
        if available < value {
            return Err(RuntimeError::InsufficientBalance {
                required: value,
                available,
            });
        }
        self.balances.insert(from, available - value);
        self.fund(to, value);
        Ok(())
    }

    fn bump_nonce(&mut self, account: Address) -> u64 {
        let entry = self.nonces.entry(account).or_default();
        let current = *entry;
        *entry = current.saturating_add(1);
        current
    }

    fn deploy(&mut self, from: Address, created: Address, value: U256, code: &[u8]) -> Address {
        if code.first() == Some(&INVALID_OPCODE) {
            debug!(%created, "Creation aborted by INVALID opcode");
            return Address::ZERO;
        }
        if self.move_value(from, created, value).is_err() {
            return Address::ZERO;
        }
        self.code.insert(created, Bytes::from_slice(code));
        created
    }
}

impl Journaled for InMemoryRuntime {
    type Snapshot = InMemoryRuntime;

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}

impl ExecutionRuntime for InMemoryRuntime {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn has_code(&self, account: Address) -> bool {
        self.code.get(&account).is_some_and(|code| !code.is_empty())
    }

    fn call(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        data: &[u8],
    ) -> Result<Bytes, RuntimeError> {
        if self.reverting.contains(&to) {
            return Err(RuntimeError::Reverted(format!("call into {to} reverted")));
        }
        self.move_value(from, to, value)?;
        self.calls.push(CallRecord {
            caller: from,
            target: to,
            value,
            data: Bytes::from_slice(data),
            delegate: false,
        });
        Ok(Bytes::new())
    }

    fn delegate_call(
        &mut self,
        context: Address,
        target: Address,
        data: &[u8],
    ) -> Result<Bytes, RuntimeError> {
        if self.reverting.contains(&target) {
            return Err(RuntimeError::Reverted(format!(
                "delegate call into {target} reverted"
            )));
        }
        self.calls.push(CallRecord {
            caller: context,
            target,
            value: U256::zero(),
            data: Bytes::from_slice(data),
            delegate: true,
        });
        Ok(Bytes::new())
    }

    fn create(&mut self, from: Address, value: U256, code: &[u8]) -> Result<Address, RuntimeError> {
        let nonce = self.bump_nonce(from);
        let created = compute_contract_address(from, nonce);
        Ok(self.deploy(from, created, value, code))
    }

    fn create2(
        &mut self,
        from: Address,
        value: U256,
        salt: Hash,
        code: &[u8],
    ) -> Result<Address, RuntimeError> {
        let created = compute_contract_address_create2(from, salt, code);
        if self.code.contains_key(&created) {
            debug!(%created, "Create2 collision");
            return Ok(Address::ZERO);
        }
        self.bump_nonce(from);
        Ok(self.deploy(from, created, value, code))
    }

    fn is_valid_signature(&self, signer: Address, digest: &Hash, _signature: &[u8]) -> [u8; 4] {
        let accepted = self
            .approved_digests
            .get(&signer)
            .is_some_and(|digests| digests.contains(digest));
        if accepted {
            VALID_SIGNATURE_MAGIC
        } else {
            [0u8; 4]
        }
    }
}
