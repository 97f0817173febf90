//! Bounded-concurrency task executor.
//!
//! [`TaskExecutor`] admits tasks against a fixed number of slots. A task that
//! fits starts immediately; a task that does not parks its submitter in the
//! [`AdmissionGate`] until enough slots are released. Only one submitter can
//! be parked at a time.
//!
//! All accounting (`free`, `task_count`, `done_count`, running tasks and the
//! pending request) lives in one `parking_lot::Mutex`. Every update happens in
//! a single critical section; events are emitted only after the lock is
//! released.
//!
//! # Lifecycle
//!
//! ```text
//! push ──► gate check ──► (park) ──► reserve slots ──► spawn task
//!                                                        │
//!          task-success / task-failure ◄── task settles ◄┘
//!                                  │
//!                                  ▼
//!          release slots ──► resume parked submitter ──► drained? ──► finished
//! ```
//!
//! - `finish()` waits for every admitted task without closing.
//! - `close()` rejects the parked submitter, asks progressing tasks to stop
//!   and waits for all tasks. Plain function tasks cannot be interrupted.
//! - `reset()` closes, then reopens with fresh counters.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::core::gate::{AdmissionGate, AdmissionOutcome};
use crate::core::{
    DrainSignal, EventChannel, EventKind, ExecutorEvent, ProgressingTask, SchedulerError,
    SlotLedger, Task, TaskArgs, TaskFuture,
};
use crate::runtime::TokioSpawner;
use crate::util::{SubscriptionId, TaskId};

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: u32 = 4;

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Point-in-time view of an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSnapshot {
    /// Executor name used in logs.
    pub name: String,
    /// Total slots.
    pub capacity: u32,
    /// Free slots.
    pub free: u32,
    /// Admitted tasks since construction or last reset.
    pub task_count: u64,
    /// Finished tasks since construction or last reset.
    pub done_count: u64,
    /// Progressing tasks currently running.
    pub running: usize,
    /// True if a submitter is parked waiting for slots.
    pub waiting: bool,
    /// True once `close` was called (until `reset`).
    pub closed: bool,
}

struct ExecutorState {
    ledger: SlotLedger,
    gate: AdmissionGate,
    closed: bool,
    /// `finished` already emitted for the current close cycle.
    finished_emitted: bool,
    running: HashMap<TaskId, Arc<dyn ProgressingTask>>,
    next_id: TaskId,
}

impl ExecutorState {
    fn take_id(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// State shared by the executor handle and every spawned task.
struct Core {
    name: String,
    state: Mutex<ExecutorState>,
    events: Arc<EventChannel>,
    drain: DrainSignal,
}

impl Core {
    /// Resume the parked submitter if it fits and publish the in-flight count.
    ///
    /// Returns true if this call claimed the `finished` emission of the
    /// current close cycle. In that case the drained state is published by
    /// [`Self::announce_drained`] once the event is out, so `close()` never
    /// returns ahead of its `finished` event.
    fn settle(&self, state: &mut ExecutorState) -> bool {
        if let Some(task_id) = state.gate.resume_if_fits(&mut state.ledger, &mut state.next_id) {
            debug!(executor = %self.name, task_id, "parked submission admitted");
        }

        let in_flight = state.ledger.snapshot().in_flight();
        if state.closed && in_flight == 0 && !state.finished_emitted {
            state.finished_emitted = true;
            return true;
        }
        self.drain.publish(in_flight);
        false
    }

    fn announce_drained(&self) {
        info!(executor = %self.name, "all tasks finished");
        self.events.emit(&ExecutorEvent::Finished);
        self.drain.publish(0);
    }

    /// Apply `update` and settle, all in one critical section.
    fn update_and_settle(&self, update: impl FnOnce(&mut ExecutorState)) {
        let drained = {
            let mut state = self.state.lock();
            update(&mut state);
            self.settle(&mut state)
        };
        if drained {
            self.announce_drained();
        }
    }

    /// Release the slots of a finished task.
    fn finalize(&self, task_id: TaskId, slots: u32) {
        self.update_and_settle(|state| {
            state.ledger.release(slots);
            state.running.remove(&task_id);
        });
        debug!(executor = %self.name, task_id, slots, "task finished, slots released");
    }

    /// Take back slots handed to a submitter that went away before launching.
    fn revoke(&self, task_id: TaskId, slots: u32) {
        self.update_and_settle(|state| state.ledger.revoke(slots));
        debug!(executor = %self.name, task_id, slots, "admission revoked, submitter gone");
    }
}

/// Runs finalization exactly once per admitted task, on every exit path.
struct Finalizer {
    core: Arc<Core>,
    task_id: TaskId,
    slots: u32,
    progress: Option<(Arc<dyn ProgressingTask>, SubscriptionId)>,
}

impl Drop for Finalizer {
    fn drop(&mut self) {
        if let Some((task, subscription)) = self.progress.take() {
            task.progress().unsubscribe(subscription);
        }
        self.core.finalize(self.task_id, self.slots);
    }
}

/// A parked submission. Dropping it before admission arrives hands any
/// already-granted slots back to the ledger.
struct ParkedSubmission {
    core: Arc<Core>,
    rx: Option<oneshot::Receiver<AdmissionOutcome>>,
    slots: u32,
}

impl ParkedSubmission {
    async fn admitted(mut self) -> Result<TaskId, SchedulerError> {
        let Some(rx) = self.rx.as_mut() else {
            return Err(SchedulerError::Closed);
        };
        let outcome = rx.await;
        self.rx = None;
        match outcome {
            Ok(Ok(admission)) => Ok(admission.task_id),
            Ok(Err(e)) => Err(e),
            // Gate cleared without an answer: only happens while closing.
            Err(_) => Err(SchedulerError::Closed),
        }
    }
}

impl Drop for ParkedSubmission {
    fn drop(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        rx.close();
        if let Ok(Ok(admission)) = rx.try_recv() {
            self.core.revoke(admission.task_id, self.slots);
        }
    }
}

enum Ticket {
    Admitted(TaskId),
    Parked(ParkedSubmission),
}

/// Bounded-concurrency executor for independent tasks.
///
/// Cheap to clone; clones share the same slots, counters and subscribers.
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_task_executor::core::{EventKind, Task, TaskExecutor};
///
/// let executor = TaskExecutor::new(4)?;
/// executor.on(EventKind::TaskSuccess, |ev| println!("{ev:?}"));
///
/// for _ in 0..10 {
///     executor
///         .push_one(Task::from_fn(|_| async { Ok(serde_json::json!(true)) }), vec![])
///         .await?;
/// }
/// executor.finish().await;
/// ```
pub struct TaskExecutor<S = TokioSpawner> {
    core: Arc<Core>,
    spawner: S,
}

impl<S: Clone> Clone for TaskExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            spawner: self.spawner.clone(),
        }
    }
}

impl TaskExecutor<TokioSpawner> {
    /// Create an executor with `capacity` slots on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidArgument` if `capacity` is zero
    /// - `SchedulerError::Runtime` if called outside a tokio runtime
    pub fn new(capacity: u32) -> Result<Self, SchedulerError> {
        Self::with_spawner(capacity, TokioSpawner::current()?)
    }
}

impl<S> TaskExecutor<S>
where
    S: Spawn + Clone + Send + 'static,
{
    /// Create an executor with `capacity` slots using `spawner` to run tasks.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidArgument` if `capacity` is zero.
    pub fn with_spawner(capacity: u32, spawner: S) -> Result<Self, SchedulerError> {
        let ledger = SlotLedger::new(capacity)?;
        Ok(Self {
            core: Arc::new(Core {
                name: "executor".into(),
                state: Mutex::new(ExecutorState {
                    ledger,
                    gate: AdmissionGate::new(),
                    closed: false,
                    finished_emitted: false,
                    running: HashMap::new(),
                    next_id: 0,
                }),
                events: Arc::new(EventChannel::new()),
                drain: DrainSignal::new(),
            }),
            spawner,
        })
    }

    /// Set the name used in log records.
    ///
    /// Only effective before the executor is cloned; afterwards the name is
    /// shared and the rename is dropped with a warning.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        match Arc::get_mut(&mut self.core) {
            Some(core) => core.name = name,
            None => warn!(
                executor = %self.core.name,
                requested = %name,
                "rename ignored: executor already cloned"
            ),
        }
        self
    }

    /// Executor name.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Total number of slots.
    pub fn capacity(&self) -> u32 {
        self.core.state.lock().ledger.capacity()
    }

    /// Number of free slots.
    pub fn free(&self) -> u32 {
        self.core.state.lock().ledger.free()
    }

    /// Number of tasks admitted since construction or the last reset.
    pub fn task_count(&self) -> u64 {
        self.core.state.lock().ledger.task_count()
    }

    /// Number of tasks finished since construction or the last reset.
    pub fn done_count(&self) -> u64 {
        self.core.state.lock().ledger.done_count()
    }

    /// True once `close` has been called (until `reset`).
    pub fn is_closed(&self) -> bool {
        self.core.state.lock().closed
    }

    /// Number of progressing tasks currently running.
    pub fn running_count(&self) -> usize {
        self.core.state.lock().running.len()
    }

    /// Consistent copy of all counters.
    pub fn snapshot(&self) -> ExecutorSnapshot {
        let state = self.core.state.lock();
        let ledger = state.ledger.snapshot();
        ExecutorSnapshot {
            name: self.core.name.clone(),
            capacity: ledger.capacity,
            free: ledger.free,
            task_count: ledger.task_count,
            done_count: ledger.done_count,
            running: state.running.len(),
            waiting: state.gate.is_waiting(),
            closed: state.closed,
        }
    }

    /// Subscribe to every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.core.events.on(kind, listener)
    }

    /// Subscribe to the next event of `kind` only.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.core.events.once(kind, listener)
    }

    /// Remove a subscription made with [`on`](Self::on) or [`once`](Self::once).
    pub fn off(&self, kind: EventKind, id: SubscriptionId) -> bool {
        self.core.events.off(kind, id)
    }

    /// Submit a task that needs one slot.
    ///
    /// # Errors
    ///
    /// Same as [`push`](Self::push).
    pub async fn push_one(&self, task: Task, args: TaskArgs) -> Result<TaskId, SchedulerError> {
        self.push(task, args, 1).await
    }

    /// Submit a task that needs `slots` slots.
    ///
    /// Returns once the task has been admitted and launched, not once it has
    /// finished. If there are not enough free slots the call suspends until a
    /// running task releases them. Task failures are reported through
    /// `task-failure` events, never through this result.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::Closed` if the executor is closed, or begins closing
    ///   while this call is suspended
    /// - `SchedulerError::InvalidArgument` if `slots` is zero or exceeds capacity
    /// - `SchedulerError::Conflict` if this call would need to suspend while
    ///   another submission is already suspended
    pub async fn push(
        &self,
        task: Task,
        args: TaskArgs,
        slots: u32,
    ) -> Result<TaskId, SchedulerError> {
        let ticket = {
            let mut state = self.core.state.lock();
            if state.closed {
                warn!(executor = %self.core.name, "submission rejected: executor is closed");
                return Err(SchedulerError::Closed);
            }
            state.ledger.validate_request(slots)?;

            if state.ledger.admit(slots) {
                let task_id = state.take_id();
                self.core.drain.publish(state.ledger.snapshot().in_flight());
                Ticket::Admitted(task_id)
            } else {
                let rx = state.gate.suspend(slots).inspect_err(|_| {
                    warn!(
                        executor = %self.core.name,
                        slots,
                        "submission rejected: another submission is already waiting"
                    );
                })?;
                debug!(
                    executor = %self.core.name,
                    slots,
                    free = state.ledger.free(),
                    "not enough free slots, submission parked"
                );
                Ticket::Parked(ParkedSubmission {
                    core: Arc::clone(&self.core),
                    rx: Some(rx),
                    slots,
                })
            }
        };

        let task_id = match ticket {
            Ticket::Admitted(task_id) => task_id,
            Ticket::Parked(parked) => parked.admitted().await.inspect_err(|_| {
                warn!(executor = %self.core.name, "parked submission rejected: executor is closed");
            })?,
        };

        self.launch(task_id, task, args, slots);
        Ok(task_id)
    }

    /// Spawn an admitted task. Slots are already reserved.
    fn launch(&self, task_id: TaskId, task: Task, args: TaskArgs, slots: u32) {
        let core = Arc::clone(&self.core);
        let name = task.name().to_owned();

        let (fut, progress): (TaskFuture, _) = match task {
            Task::Fn(f) => (f.call(args), None),
            Task::Progressing(task) => {
                let stop_now = {
                    let mut state = core.state.lock();
                    state.running.insert(task_id, Arc::clone(&task));
                    state.closed
                };
                let events = Arc::clone(&core.events);
                let subscription = task.progress().subscribe(move |progress| {
                    events.emit(&ExecutorEvent::TaskUpdate {
                        task_id,
                        progress: progress.clone(),
                    });
                });

                let runner = Arc::clone(&task);
                let fut: TaskFuture = Box::pin(async move {
                    if stop_now {
                        // Closed between admission and launch: the stop request
                        // issued by `close()` could not have reached this task.
                        let (output, stopped) = futures::join!(runner.run(args), runner.close());
                        if let Err(e) = stopped {
                            warn!(task_id, error = %e, "stop request failed");
                        }
                        output
                    } else {
                        runner.run(args).await
                    }
                });
                (fut, Some((task, subscription)))
            }
        };

        debug!(executor = %core.name, task_id, task = %name, slots, "task started");

        self.spawner.spawn(async move {
            let guard = Finalizer {
                core: Arc::clone(&core),
                task_id,
                slots,
                progress,
            };

            let event = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(output)) => ExecutorEvent::TaskSuccess { task_id, output },
                Ok(Err(error)) => {
                    debug!(task_id, task = %name, error = %error, "task failed");
                    ExecutorEvent::TaskFailure {
                        task_id,
                        error: Arc::new(error),
                    }
                }
                Err(panic) => {
                    let msg = panic_message(panic.as_ref());
                    error!(task_id, task = %name, "task panicked: {}", msg);
                    ExecutorEvent::TaskFailure {
                        task_id,
                        error: Arc::new(anyhow::anyhow!("task panicked: {msg}")),
                    }
                }
            };

            core.events.emit(&event);
            drop(guard);
        });
    }

    /// Wait until every admitted task has finished, without closing.
    ///
    /// Emits `finished` when it returns, unless the executor is closed, in
    /// which case the close cycle emits it exactly once.
    pub async fn finish(&self) {
        let idle = self.core.state.lock().ledger.is_drained();
        if !idle {
            self.core.drain.drained().await;
        }
        if idle || !self.is_closed() {
            info!(executor = %self.core.name, "all tasks finished");
            self.core.events.emit(&ExecutorEvent::Finished);
        }
    }

    /// Close the executor and wait for running tasks.
    ///
    /// Rejects the parked submitter with `Closed`, asks every running
    /// progressing task to stop and waits until all admitted tasks have
    /// finished. Plain function tasks run to completion. Safe to call again.
    pub async fn close(&self) {
        let (to_stop, drained) = {
            let mut state = self.core.state.lock();
            state.closed = true;
            if state.gate.fail(SchedulerError::Closed) {
                debug!(executor = %self.core.name, "parked submission failed by close");
            }
            let to_stop: Vec<_> = state
                .running
                .iter()
                .map(|(id, task)| (*id, Arc::clone(task)))
                .collect();
            let drained = state.ledger.is_drained() && !state.finished_emitted;
            if drained {
                state.finished_emitted = true;
            }
            (to_stop, drained)
        };

        info!(
            executor = %self.core.name,
            stopping = to_stop.len(),
            "executor closing"
        );
        if drained {
            self.core.announce_drained();
        }

        futures::future::join_all(to_stop.into_iter().map(|(task_id, task)| {
            let core = Arc::clone(&self.core);
            async move {
                if let Err(e) = task.close().await {
                    warn!(executor = %core.name, task_id, error = %e, "stop request failed");
                }
                core.state.lock().running.remove(&task_id);
            }
        }))
        .await;

        self.core.drain.drained().await;
    }

    /// Close, then reopen with fresh counters and every slot free.
    pub async fn reset(&self) {
        self.close().await;
        {
            let mut state = self.core.state.lock();
            state.closed = false;
            state.finished_emitted = false;
            state.ledger.reset();
            state.running.clear();
            state.gate.clear();
            self.core.drain.publish(0);
        }
        info!(executor = %self.core.name, "executor reset");
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}
