//! API-facing response models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::core::{ExecutorSnapshot, Spawn, TaskExecutor};

/// Status of one executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorStatusResponse {
    /// Counters at the time of the call.
    #[serde(flatten)]
    pub snapshot: ExecutorSnapshot,
    /// Slots currently reserved by running tasks.
    pub used: u32,
    /// Tasks admitted but not yet finished.
    pub in_flight: u64,
}

/// Configured executor, as listed from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorListing {
    /// Executor name.
    pub name: String,
    /// Configured slots.
    pub capacity: u32,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Build the status response for an executor.
pub fn status<S>(executor: &TaskExecutor<S>) -> ExecutorStatusResponse
where
    S: Spawn + Clone + Send + 'static,
{
    let snapshot = executor.snapshot();
    ExecutorStatusResponse {
        used: snapshot.capacity - snapshot.free,
        in_flight: snapshot.task_count - snapshot.done_count,
        snapshot,
    }
}

/// Build the status of every executor, sorted by name.
pub fn status_all<S>(executors: &HashMap<String, TaskExecutor<S>>) -> Vec<ExecutorStatusResponse>
where
    S: Spawn + Clone + Send + 'static,
{
    let mut all: Vec<_> = executors.values().map(status).collect();
    all.sort_by(|a, b| a.snapshot.name.cmp(&b.snapshot.name));
    all
}

/// List configured executors, sorted by name.
pub fn list_executors(cfg: &SchedulerConfig) -> Vec<ExecutorListing> {
    let mut listings: Vec<_> = cfg
        .executors
        .iter()
        .map(|(name, executor)| ExecutorListing {
            name: name.clone(),
            capacity: executor.capacity,
        })
        .collect();
    listings.sort_by(|a, b| a.name.cmp(&b.name));
    listings
}

/// Return a health payload.
pub const fn health() -> Health {
    Health { ok: true }
}
