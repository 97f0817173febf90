//! Task handles accepted by the executor.
//!
//! A [`Task`] is either a plain function ([`TaskFn`]) or a
//! [`ProgressingTask`]. Plain functions are opaque: they run to completion
//! and cannot be interrupted. Progressing tasks report incremental progress
//! through their [`Progress`] stream and accept a cooperative stop request
//! via [`ProgressingTask::close`].
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use prometheus_task_executor::core::{Progress, ProgressingTask, TaskArgs, TaskOutput};
//!
//! #[derive(Default)]
//! struct Download {
//!     progress: Progress,
//! }
//!
//! #[async_trait]
//! impl ProgressingTask for Download {
//!     fn progress(&self) -> &Progress {
//!         &self.progress
//!     }
//!
//!     async fn run(&self, _args: TaskArgs) -> TaskOutput {
//!         for pct in [25, 50, 75, 100] {
//!             self.progress.report(pct);
//!         }
//!         Ok(serde_json::json!("done"))
//!     }
//!
//!     async fn close(&self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::events::Observers;
use crate::util::SubscriptionId;

/// Arguments bound to a task at submission.
pub type TaskArgs = Vec<Value>;

/// Settled result of a task.
pub type TaskOutput = anyhow::Result<Value>;

/// Boxed future produced by a [`TaskFn`].
pub type TaskFuture = Pin<Box<dyn Future<Output = TaskOutput> + Send + 'static>>;

/// Progress stream of a [`ProgressingTask`].
///
/// Implementations embed one and call [`report`](Self::report); the executor
/// subscribes while the task runs and forwards each report as a
/// `task-update` event.
#[derive(Debug, Default)]
pub struct Progress {
    observers: Observers<Value>,
}

impl Progress {
    /// Create a progress stream with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an `update` to current subscribers. Returns how many were notified.
    pub fn report(&self, progress: impl Into<Value>) -> usize {
        self.observers.emit(&progress.into())
    }

    /// Subscribe to every update.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.observers.on(listener)
    }

    /// Subscribe to the next update only.
    pub fn subscribe_once<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.observers.once(listener)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.off(id)
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

/// Long-running task that reports progress and can be asked to stop.
///
/// The caller creates the task, the executor starts it with
/// [`run`](Self::run). Progress reports made before `run` settles are
/// forwarded as `task-update` events.
#[async_trait]
pub trait ProgressingTask: Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Progress stream the executor subscribes to.
    fn progress(&self) -> &Progress;

    /// Perform the task. Must eventually settle.
    async fn run(&self, args: TaskArgs) -> TaskOutput;

    /// Request early termination. Must eventually settle; `run` is expected
    /// to settle soon after.
    async fn close(&self) -> anyhow::Result<()>;
}

type BoxTaskFn = dyn Fn(TaskArgs) -> TaskFuture + Send + Sync + 'static;

/// Function-backed task. Each call produces a fresh future.
#[derive(Clone)]
pub struct TaskFn {
    name: Cow<'static, str>,
    f: Arc<BoxTaskFn>,
}

impl fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}

impl TaskFn {
    /// Wrap a closure producing the task's future.
    pub fn new<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(TaskArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskOutput> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |args: TaskArgs| -> TaskFuture { Box::pin(f(args)) }),
        }
    }

    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function with bound arguments.
    pub fn call(&self, args: TaskArgs) -> TaskFuture {
        (self.f)(args)
    }
}

/// Work unit accepted by [`TaskExecutor::push`](crate::core::TaskExecutor::push).
#[derive(Clone)]
pub enum Task {
    /// Plain function: fire-and-forget, uncancellable once started.
    Fn(TaskFn),
    /// Task with progress reporting and cooperative stop.
    Progressing(Arc<dyn ProgressingTask>),
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fn(func) => f.debug_tuple("Fn").field(&func.name()).finish(),
            Self::Progressing(task) => f.debug_tuple("Progressing").field(&task.name()).finish(),
        }
    }
}

impl Task {
    /// Build a plain task from a closure.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(TaskArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskOutput> + Send + 'static,
    {
        Self::Fn(TaskFn::new("fn", f))
    }

    /// Build a progressing task handle.
    pub fn progressing<T: ProgressingTask>(task: Arc<T>) -> Self {
        Self::Progressing(task)
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Fn(func) => func.name(),
            Self::Progressing(task) => task.name(),
        }
    }
}

impl From<TaskFn> for Task {
    fn from(f: TaskFn) -> Self {
        Self::Fn(f)
    }
}

impl From<Arc<dyn ProgressingTask>> for Task {
    fn from(task: Arc<dyn ProgressingTask>) -> Self {
        Self::Progressing(task)
    }
}
