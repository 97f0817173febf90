//! Configuration models for executors and their runtimes.

pub mod executor;

pub use executor::{ExecutorConfig, RuntimeConfig, SchedulerConfig};
