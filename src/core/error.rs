//! Error types for executor operations.

use thiserror::Error;

/// Errors produced by executor components.
///
/// Task-level failures never surface here: a task that fails is reported
/// through a `task-failure` event and its submission still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Capacity, slot count or configuration value is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Executor is closed or closing.
    #[error("executor is closed")]
    Closed,
    /// Another submission is already suspended waiting for slots.
    #[error("another submission is already waiting for slots")]
    Conflict,
    /// Runtime adapter failure (no reactor, runtime build failed).
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SchedulerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
