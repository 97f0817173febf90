//! Single-waiter admission gate.
//!
//! When a submission finds too few free slots it parks here as the one
//! [`PendingAdmission`]. Exactly one submitter may be parked at a time; a
//! second submitter that would need to park is rejected with
//! [`SchedulerError::Conflict`] instead of being queued.
//!
//! Resumption is a hand-off: the finalizer of a finished task reserves the
//! waiter's slots in the ledger *before* waking it, inside the executor's
//! critical section, so no other submission can take the released slots.

use tokio::sync::oneshot;

use crate::core::{SchedulerError, SlotLedger};
use crate::util::TaskId;

/// Grant delivered to a resumed submitter. Slots are already reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Id assigned to the admitted task.
    pub task_id: TaskId,
}

/// Outcome delivered to a parked submitter.
pub type AdmissionOutcome = Result<Admission, SchedulerError>;

/// The one outstanding request for slots.
#[derive(Debug)]
pub struct PendingAdmission {
    slots: u32,
    resume: oneshot::Sender<AdmissionOutcome>,
}

impl PendingAdmission {
    /// Slots the parked submitter asked for.
    pub const fn slots(&self) -> u32 {
        self.slots
    }

    /// True if the parked submitter went away (its future was dropped).
    pub fn is_abandoned(&self) -> bool {
        self.resume.is_closed()
    }
}

/// Holder of at most one [`PendingAdmission`].
#[derive(Debug, Default)]
pub struct AdmissionGate {
    pending: Option<PendingAdmission>,
}

impl AdmissionGate {
    /// Create an empty gate.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// True if a live submitter is parked.
    pub fn is_waiting(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.is_abandoned())
    }

    /// Slots requested by the parked submitter, if any.
    pub fn requested_slots(&self) -> Option<u32> {
        self.pending
            .as_ref()
            .filter(|p| !p.is_abandoned())
            .map(PendingAdmission::slots)
    }

    /// Park a submitter that needs `slots`.
    ///
    /// An abandoned request left behind by a dropped submitter is discarded.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::Conflict` if a live submitter is already parked.
    pub fn suspend(
        &mut self,
        slots: u32,
    ) -> Result<oneshot::Receiver<AdmissionOutcome>, SchedulerError> {
        if self.is_waiting() {
            return Err(SchedulerError::Conflict);
        }
        let (resume, rx) = oneshot::channel();
        self.pending = Some(PendingAdmission { slots, resume });
        Ok(rx)
    }

    /// Admit the parked submitter if the ledger now has room for it.
    ///
    /// Reserves the slots, assigns the next id and wakes the submitter. If the
    /// submitter vanished in the meantime the reservation is rolled back before
    /// returning, so the ledger never shows slots held by nobody.
    ///
    /// Returns the id handed to the submitter.
    pub fn resume_if_fits(
        &mut self,
        ledger: &mut SlotLedger,
        next_id: &mut TaskId,
    ) -> Option<TaskId> {
        let slots = self.pending.as_ref()?.slots;
        if !ledger.fits(slots) {
            return None;
        }
        let pending = self.pending.take()?;
        if pending.is_abandoned() || !ledger.admit(slots) {
            return None;
        }

        let task_id = *next_id;
        *next_id += 1;
        if pending.resume.send(Ok(Admission { task_id })).is_err() {
            ledger.revoke(slots);
            return None;
        }
        Some(task_id)
    }

    /// Fail the parked submitter with `err`. Returns true if one was parked.
    pub fn fail(&mut self, err: SchedulerError) -> bool {
        self.pending
            .take()
            .is_some_and(|pending| pending.resume.send(Err(err)).is_ok())
    }

    /// Drop any parked request without notifying it.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}
