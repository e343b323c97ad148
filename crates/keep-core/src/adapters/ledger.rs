//! # In-Memory Membership Ledger
//!
//! Multi-identifier balance ledger held in hash maps. Snapshots are full
//! clones, which is fine for the sizes a group-custody unit deals with.

use crate::errors::LedgerError;
use crate::ports::outbound::{Journaled, MembershipLedger};
use keep_types::{Address, TokenId, U256};
use std::collections::{HashMap, HashSet};

/// In-memory ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    balances: HashMap<(Address, TokenId), U256>,
    supplies: HashMap<TokenId, U256>,
    operators: HashSet<(Address, Address)>,
    transferable: HashSet<TokenId>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-zero balance entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.balances.len()
    }

    fn debit(&mut self, account: Address, id: TokenId, amount: U256) -> Result<(), LedgerError> {
        let balance = self.balance_of(account, id);
        if balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                id,
                balance,
                required: amount,
            });
        }
        let remaining = balance - amount;
        if remaining.is_zero() {
            self.balances.remove(&(account, id));
        } else {
            self.balances.insert((account, id), remaining);
        }
        Ok(())
    }

    fn credit(&mut self, account: Address, id: TokenId, amount: U256) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let balance = self.balance_of(account, id);
        let updated = balance
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow(id))?;
        self.balances.insert((account, id), updated);
        Ok(())
    }
}

impl Journaled for InMemoryLedger {
    type Snapshot = InMemoryLedger;

    fn snapshot(&self) -> Self::Snapshot {
        self.clone()
    }

    fn restore(&mut self, snapshot: Self::Snapshot) {
        *self = snapshot;
    }
}

impl MembershipLedger for InMemoryLedger {
    fn balance_of(&self, account: Address, id: TokenId) -> U256 {
        self.balances.get(&(account, id)).copied().unwrap_or_default()
    }

    fn total_supply(&self, id: TokenId) -> U256 {
        self.supplies.get(&id).copied().unwrap_or_default()
    }

    fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.operators.contains(&(owner, operator))
    }

    fn transferable(&self, id: TokenId) -> bool {
        self.transferable.contains(&id)
    }

    fn mint(&mut self, to: Address, id: TokenId, amount: U256) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        let supply = self
            .total_supply(id)
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow(id))?;
        self.credit(to, id, amount)?;
        self.supplies.insert(id, supply);
        Ok(())
    }

    fn burn(&mut self, from: Address, id: TokenId, amount: U256) -> Result<(), LedgerError> {
        self.debit(from, id, amount)?;
        // Supply is the sum of balances, so it covers any successful debit
        let supply = self.total_supply(id).saturating_sub(amount);
        if supply.is_zero() {
            self.supplies.remove(&id);
        } else {
            self.supplies.insert(id, supply);
        }
        Ok(())
    }

    fn transfer(
        &mut self,
        from: Address,
        to: Address,
        id: TokenId,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        self.debit(from, id, amount)?;
        self.credit(to, id, amount)
    }

    fn set_approval_for_all(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((owner, operator));
        } else {
            self.operators.remove(&(owner, operator));
        }
    }

    fn set_transferability(&mut self, id: TokenId, on: bool) {
        if on {
            self.transferable.insert(id);
        } else {
            self.transferable.remove(&id);
        }
    }
}
