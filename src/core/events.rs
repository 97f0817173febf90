//! Event channel: ordered, multi-subscriber notification of task outcomes.
//!
//! Each event kind has its own [`Observers`] registry. Listeners are plain
//! synchronous callbacks invoked on the emitting task, in subscription order.
//! Emission never holds a lock while a listener runs, so listeners may
//! subscribe or unsubscribe from inside a callback. A panicking listener is
//! isolated and logged; remaining listeners still receive the event.
//!
//! The same registry type backs the progress stream of a
//! [`ProgressingTask`](crate::core::ProgressingTask).

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{SubscriptionId, TaskId};

/// Shared listener callback.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

struct Entry<E> {
    id: SubscriptionId,
    once: bool,
    listener: Listener<E>,
}

/// Insertion-ordered registry of listeners for one event stream.
pub struct Observers<E> {
    entries: Mutex<Vec<Entry<E>>>,
    next_id: AtomicU64,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<E> Observers<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    fn insert(&self, once: bool, listener: Listener<E>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push(Entry { id, once, listener });
        id
    }

    /// Register a persistent listener.
    pub fn on<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.insert(false, Arc::new(listener))
    }

    /// Register a listener that is removed after its first delivery.
    pub fn once<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.insert(true, Arc::new(listener))
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// One-shot listeners are removed before delivery, so concurrent emitters
    /// never deliver the same one-shot listener twice.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &E) -> usize {
        let targets: Vec<Listener<E>> = {
            let mut entries = self.entries.lock();
            let targets = entries.iter().map(|e| Arc::clone(&e.listener)).collect();
            entries.retain(|e| !e.once);
            targets
        };

        for listener in &targets {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::error!("event listener panicked; continuing with remaining listeners");
            }
        }
        targets.len()
    }
}

/// Names of the events published by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// A task settled successfully.
    TaskSuccess,
    /// A task settled with an error (or panicked).
    TaskFailure,
    /// A progressing task reported progress.
    TaskUpdate,
    /// Every admitted task has finished.
    Finished,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::TaskSuccess,
        Self::TaskFailure,
        Self::TaskUpdate,
        Self::Finished,
    ];

    /// Wire name of the event.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskSuccess => "task-success",
            Self::TaskFailure => "task-failure",
            Self::TaskUpdate => "task-update",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event published by the executor.
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    /// A task returned a value.
    TaskSuccess {
        /// Task that settled.
        task_id: TaskId,
        /// Value returned by the task.
        output: Value,
    },
    /// A task returned an error or panicked.
    TaskFailure {
        /// Task that settled.
        task_id: TaskId,
        /// Error produced by the task.
        error: Arc<anyhow::Error>,
    },
    /// A progressing task reported progress.
    TaskUpdate {
        /// Reporting task.
        task_id: TaskId,
        /// Progress payload as reported by the task.
        progress: Value,
    },
    /// All admitted tasks have finished.
    Finished,
}

impl ExecutorEvent {
    /// Kind of this event.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TaskSuccess { .. } => EventKind::TaskSuccess,
            Self::TaskFailure { .. } => EventKind::TaskFailure,
            Self::TaskUpdate { .. } => EventKind::TaskUpdate,
            Self::Finished => EventKind::Finished,
        }
    }

    /// Task the event refers to, if any.
    pub const fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::TaskSuccess { task_id, .. }
            | Self::TaskFailure { task_id, .. }
            | Self::TaskUpdate { task_id, .. } => Some(*task_id),
            Self::Finished => None,
        }
    }
}

/// Per-kind listener registries for [`ExecutorEvent`]s.
#[derive(Debug, Default)]
pub struct EventChannel {
    success: Observers<ExecutorEvent>,
    failure: Observers<ExecutorEvent>,
    update: Observers<ExecutorEvent>,
    finished: Observers<ExecutorEvent>,
}

impl EventChannel {
    /// Create a channel with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    const fn observers(&self, kind: EventKind) -> &Observers<ExecutorEvent> {
        match kind {
            EventKind::TaskSuccess => &self.success,
            EventKind::TaskFailure => &self.failure,
            EventKind::TaskUpdate => &self.update,
            EventKind::Finished => &self.finished,
        }
    }

    /// Subscribe to every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.observers(kind).on(listener)
    }

    /// Subscribe to the next event of `kind` only.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.observers(kind).once(listener)
    }

    /// Remove a subscription made on `kind`.
    pub fn off(&self, kind: EventKind, id: SubscriptionId) -> bool {
        self.observers(kind).off(id)
    }

    /// Number of listeners for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.observers(kind).len()
    }

    /// Deliver `event` to the listeners of its kind.
    pub fn emit(&self, event: &ExecutorEvent) -> usize {
        self.observers(event.kind()).emit(event)
    }
}
