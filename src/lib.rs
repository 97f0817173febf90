//! # Prometheus Task Executor
//!
//! A bounded-concurrency task executor for batch workloads of independent tasks.
//!
//! Callers submit tasks that each reserve a number of abstract *slots* out of a
//! fixed capacity. A task that fits starts right away; a task that does not fit
//! suspends its submitter until running tasks release enough slots. Outcomes are
//! reported through events rather than through the submission call.
//!
//! ## Key Features
//!
//! - **Slot Accounting**: `free + reserved == capacity` at all times, kept under one lock
//! - **Backpressure**: a full executor parks one submitter; a second one gets `Conflict`
//! - **Events**: `task-success`, `task-failure`, `task-update` and `finished`,
//!   delivered in subscription order
//! - **Progressing Tasks**: tasks may report progress and accept a cooperative stop
//! - **Lifecycle**: `finish` (drain), `close` (reject, stop, drain) and `reset` (reuse)
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_task_executor::core::{EventKind, Task, TaskExecutor};
//!
//! let executor = TaskExecutor::new(4)?;
//! executor.on(EventKind::TaskFailure, |ev| tracing::warn!("{ev:?}"));
//!
//! for n in 0..100 {
//!     let task = Task::from_fn(move |_| async move { Ok(serde_json::json!(n * 2)) });
//!     executor.push_one(task, vec![]).await?;
//! }
//! executor.finish().await;
//! assert_eq!(executor.done_count(), 100);
//! ```
//!
//! Ordering between tasks is the caller's business: sort dependent work before
//! submitting it.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core executor abstractions and slot accounting.
pub mod core;
/// Configuration models for executors and runtimes.
pub mod config;
/// Builders to construct executors from configuration.
pub mod builders;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
