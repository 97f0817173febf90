//! Core executor abstractions and slot accounting.

pub mod error;
pub mod events;
pub mod executor;
pub mod gate;
pub mod ledger;
pub mod signal;
pub mod task;

pub use error::{AppResult, SchedulerError};
pub use events::{EventChannel, EventKind, ExecutorEvent, Listener, Observers};
pub use executor::{ExecutorSnapshot, Spawn, TaskExecutor, DEFAULT_CAPACITY};
pub use gate::{Admission, AdmissionGate, AdmissionOutcome, PendingAdmission};
pub use ledger::{LedgerSnapshot, SlotLedger};
pub use signal::DrainSignal;
pub use task::{Progress, ProgressingTask, Task, TaskArgs, TaskFn, TaskFuture, TaskOutput};
