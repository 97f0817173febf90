//! Builders to construct task executors from configuration.

use std::collections::HashMap;

use crate::config::{ExecutorConfig, RuntimeConfig, SchedulerConfig};
use crate::core::{SchedulerError, Spawn, TaskExecutor};
use crate::runtime::TokioSpawner;

/// Build the tokio spawner selected by `cfg.runtime`.
///
/// # Errors
///
/// Returns `SchedulerError::Runtime` if no runtime is available or a dedicated
/// runtime cannot be built.
pub fn spawner_for(cfg: &ExecutorConfig) -> Result<TokioSpawner, SchedulerError> {
    match cfg.runtime {
        RuntimeConfig::Current => TokioSpawner::current(),
        #[cfg(feature = "tokio-runtime")]
        RuntimeConfig::Dedicated { worker_threads } => {
            TokioSpawner::with_worker_threads(worker_threads)
        }
        #[cfg(not(feature = "tokio-runtime"))]
        RuntimeConfig::Dedicated { .. } => Err(SchedulerError::Runtime(
            "dedicated runtimes require the `tokio-runtime` feature".into(),
        )),
    }
}

/// Build a single named executor on the runtime selected by its configuration.
///
/// # Errors
///
/// - `SchedulerError::InvalidArgument` if the configuration is invalid
/// - `SchedulerError::Runtime` if the runtime cannot be obtained
pub fn build_executor(
    name: &str,
    cfg: &ExecutorConfig,
) -> Result<TaskExecutor<TokioSpawner>, SchedulerError> {
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidArgument(format!("executor `{name}` invalid: {e}")))?;
    let spawner = spawner_for(cfg)?;
    Ok(TaskExecutor::with_spawner(cfg.capacity, spawner)?.named(name))
}

/// Build every executor in `cfg` on tokio runtimes.
///
/// # Errors
///
/// Same as [`build_executor`].
pub fn build_executors(
    cfg: &SchedulerConfig,
) -> Result<HashMap<String, TaskExecutor<TokioSpawner>>, SchedulerError> {
    build_executors_with(cfg, |_, executor_cfg| spawner_for(executor_cfg))
}

/// Build every executor in `cfg` using a caller-provided spawner factory.
///
/// # Errors
///
/// - `SchedulerError::InvalidArgument` if the configuration is invalid
/// - any error returned by `spawner_factory`
pub fn build_executors_with<S, FS>(
    cfg: &SchedulerConfig,
    mut spawner_factory: FS,
) -> Result<HashMap<String, TaskExecutor<S>>, SchedulerError>
where
    S: Spawn + Clone + Send + 'static,
    FS: FnMut(&str, &ExecutorConfig) -> Result<S, SchedulerError>,
{
    cfg.validate()
        .map_err(|e| SchedulerError::InvalidArgument(format!("config invalid: {e}")))?;

    let mut executors = HashMap::new();
    for (name, executor_cfg) in &cfg.executors {
        let spawner = spawner_factory(name, executor_cfg)?;
        let executor = TaskExecutor::with_spawner(executor_cfg.capacity, spawner)?.named(name);
        tracing::debug!(executor = %name, capacity = executor_cfg.capacity, "executor built");
        executors.insert(name.clone(), executor);
    }

    Ok(executors)
}
