//! `ChairPool` - waiting-room capacity.
//!
//! A plain counter with no synchronization of its own; it is only mutated
//! while the waiting-area lock is held, together with queue membership.

use crate::errors::{invariant, HelpDeskError};

/// Free seats in the waiting room. `0 <= free <= total` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChairPool {
    total: u32,
    free: u32,
}

impl ChairPool {
    /// A pool with every chair free.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self { total, free: total }
    }

    /// Take a chair if one is free.
    ///
    /// Failure is not an error: the caller goes back to work and retries.
    pub fn try_acquire(&mut self) -> bool {
        if self.free == 0 {
            return false;
        }
        self.free -= 1;
        true
    }

    /// Return a chair to the pool.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolated` if every chair is already free; the pool is
    /// left at `total`.
    pub fn release(&mut self) -> Result<(), HelpDeskError> {
        if self.free >= self.total {
            return Err(invariant(format!(
                "chair released with all {} chairs already free",
                self.total
            )));
        }
        self.free += 1;
        Ok(())
    }

    #[must_use]
    pub fn free(&self) -> u32 {
        self.free
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Chairs currently occupied.
    #[must_use]
    pub fn seated(&self) -> u32 {
        self.total - self.free
    }
}
