//! # Re-entrancy Guard
//!
//! Records which thread is inside an entry point. A nested entry from that
//! same thread (a dispatched target calling back into the unit) is refused
//! instead of deadlocking on the engine lock. Other threads are unaffected
//! and simply wait for the lock.

use crate::errors::KeepError;
use parking_lot::Mutex;
use std::thread::{self, ThreadId};

/// Tracks the thread currently running an entry point.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    holder: Mutex<Option<ThreadId>>,
}

impl ReentrancyGuard {
    /// Creates an idle guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when the calling thread is already inside an entry point.
    ///
    /// # Errors
    ///
    /// `Reentrancy`.
    pub fn check(&self) -> Result<(), KeepError> {
        if *self.holder.lock() == Some(thread::current().id()) {
            return Err(KeepError::Reentrancy);
        }
        Ok(())
    }

    /// Marks the calling thread as inside an entry point until the returned
    /// scope is dropped. Call only while holding the engine lock.
    #[must_use]
    pub fn hold(&self) -> HeldScope<'_> {
        *self.holder.lock() = Some(thread::current().id());
        HeldScope { guard: self }
    }

    /// Whether any thread is inside an entry point.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }
}

/// Clears the guard on drop.
#[derive(Debug)]
pub struct HeldScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for HeldScope<'_> {
    fn drop(&mut self) {
        *self.guard.holder.lock() = None;
    }
}
