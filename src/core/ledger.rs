//! Slot accounting for the executor.
//!
//! The ledger is pure bookkeeping: it never blocks, never spawns and never
//! emits events. The executor owns exactly one ledger behind its state mutex,
//! so every method here runs inside a single critical section.

use serde::{Deserialize, Serialize};

use crate::core::SchedulerError;

/// Point-in-time copy of the ledger counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Total slots.
    pub capacity: u32,
    /// Slots not reserved by any running task.
    pub free: u32,
    /// Tasks admitted since construction or the last reset.
    pub task_count: u64,
    /// Tasks finished since construction or the last reset.
    pub done_count: u64,
}

impl LedgerSnapshot {
    /// Tasks admitted but not yet finished.
    pub const fn in_flight(&self) -> u64 {
        self.task_count - self.done_count
    }
}

/// Free/used slot counts plus admission counters.
///
/// Invariants:
/// - `free <= capacity`
/// - `done_count <= task_count`
/// - `free + reserved(running) == capacity`
#[derive(Debug, Clone)]
pub struct SlotLedger {
    capacity: u32,
    free: u32,
    task_count: u64,
    done_count: u64,
}

impl SlotLedger {
    /// Create a ledger with every slot free.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidArgument` if `capacity` is zero.
    pub fn new(capacity: u32) -> Result<Self, SchedulerError> {
        if capacity == 0 {
            return Err(SchedulerError::invalid("capacity must be a positive integer"));
        }
        Ok(Self {
            capacity,
            free: capacity,
            task_count: 0,
            done_count: 0,
        })
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of free slots.
    pub const fn free(&self) -> u32 {
        self.free
    }

    /// Number of admitted tasks.
    pub const fn task_count(&self) -> u64 {
        self.task_count
    }

    /// Number of finished tasks.
    pub const fn done_count(&self) -> u64 {
        self.done_count
    }

    /// True when every admitted task has finished.
    pub const fn is_drained(&self) -> bool {
        self.done_count == self.task_count
    }

    /// True if `slots` can be reserved right now.
    pub const fn fits(&self, slots: u32) -> bool {
        self.free >= slots
    }

    /// Check a slot request against the ledger's static limits.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidArgument` for zero slots or for a request
    /// larger than the whole capacity (it could never be admitted).
    pub fn validate_request(&self, slots: u32) -> Result<(), SchedulerError> {
        if slots == 0 {
            return Err(SchedulerError::invalid(
                "slots must be an integer greater than zero",
            ));
        }
        if slots > self.capacity {
            return Err(SchedulerError::invalid(format!(
                "slots ({slots}) exceed capacity ({})",
                self.capacity
            )));
        }
        Ok(())
    }

    /// Reserve `slots` for a newly admitted task.
    ///
    /// Returns false and leaves the ledger untouched if there is not enough room.
    pub fn admit(&mut self, slots: u32) -> bool {
        if !self.fits(slots) {
            return false;
        }
        self.free -= slots;
        self.task_count += 1;
        true
    }

    /// Undo an [`admit`](Self::admit) whose task was never launched.
    pub(crate) fn revoke(&mut self, slots: u32) {
        debug_assert!(self.task_count > self.done_count);
        self.free = (self.free + slots).min(self.capacity);
        self.task_count -= 1;
    }

    /// Return `slots` of a finished task and count it as done.
    pub fn release(&mut self, slots: u32) {
        debug_assert!(self.done_count < self.task_count);
        debug_assert!(self.free + slots <= self.capacity);
        self.done_count += 1;
        self.free = (self.free + slots).min(self.capacity);
    }

    /// Forget all history and free every slot.
    pub fn reset(&mut self) {
        self.free = self.capacity;
        self.task_count = 0;
        self.done_count = 0;
    }

    /// Copy the counters.
    pub const fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            capacity: self.capacity,
            free: self.free,
            task_count: self.task_count,
            done_count: self.done_count,
        }
    }
}
