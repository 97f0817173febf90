//! Builders to construct executors from configuration.

pub mod executor_builder;

pub use executor_builder::{build_executor, build_executors, build_executors_with, spawner_for};
