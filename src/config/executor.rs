//! Executor and scheduler configuration structures.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_CAPACITY;

/// Environment variable holding the executor capacity.
pub const ENV_CAPACITY: &str = "TASK_EXECUTOR_CAPACITY";
/// Environment variable selecting a dedicated runtime (`auto` or a thread count).
pub const ENV_WORKER_THREADS: &str = "TASK_EXECUTOR_WORKER_THREADS";

/// Runtime adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeConfig {
    /// Spawn on the tokio runtime the executor is created on.
    #[default]
    Current,
    /// Spawn on a dedicated multi-threaded runtime owned by the executor.
    Dedicated {
        /// Worker threads; defaults to the number of CPUs.
        #[serde(default = "default_worker_threads")]
        worker_threads: usize,
    },
}

fn default_worker_threads() -> usize {
    num_cpus::get()
}

const fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

/// Configuration of a single executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Number of slots.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Runtime adapter selection.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            runtime: RuntimeConfig::Current,
        }
    }
}

/// Root configuration: named executors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of executor name to configuration.
    pub executors: HashMap<String, ExecutorConfig>,
}

impl ExecutorConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if let RuntimeConfig::Dedicated { worker_threads: 0 } = self.runtime {
            return Err("worker_threads must be greater than 0".into());
        }
        Ok(())
    }

    /// Build configuration from the environment, loading `.env` first if present.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable or invalid value.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a description of an unparsable or invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut cfg = Self::default();

        if let Some(raw) = lookup(ENV_CAPACITY) {
            cfg.capacity = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_CAPACITY}={raw:?}: {e}"))?;
        }

        if let Some(raw) = lookup(ENV_WORKER_THREADS) {
            let raw = raw.trim();
            let worker_threads = if raw.eq_ignore_ascii_case("auto") {
                default_worker_threads()
            } else {
                raw.parse()
                    .map_err(|e| format!("{ENV_WORKER_THREADS}={raw:?}: {e}"))?
            };
            cfg.runtime = RuntimeConfig::Dedicated { worker_threads };
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

impl SchedulerConfig {
    /// Validate all executors and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Returns a description naming the first invalid executor.
    pub fn validate(&self) -> Result<(), String> {
        if self.executors.is_empty() {
            return Err("at least one executor must be defined".into());
        }
        for (name, executor) in &self.executors {
            executor
                .validate()
                .map_err(|e| format!("executor `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
