//! Tests for configuration validation

use prometheus_task_executor::config::{ExecutorConfig, RuntimeConfig, SchedulerConfig};
use std::collections::HashMap;

#[test]
fn test_executor_config_validation() {
    let valid = ExecutorConfig {
        capacity: 8,
        runtime: RuntimeConfig::Current,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_executor_config_invalid_capacity() {
    let invalid = ExecutorConfig {
        capacity: 0,
        runtime: RuntimeConfig::Current,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_executor_config_invalid_worker_threads() {
    let invalid = ExecutorConfig {
        capacity: 4,
        runtime: RuntimeConfig::Dedicated { worker_threads: 0 },
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_requires_executor() {
    let empty = SchedulerConfig {
        executors: HashMap::new(),
    };
    assert!(empty.validate().is_err());
}

#[test]
fn test_scheduler_config_names_invalid_executor() {
    let mut executors = HashMap::new();
    executors.insert(
        "broken".to_string(),
        ExecutorConfig {
            capacity: 0,
            runtime: RuntimeConfig::Current,
        },
    );
    let err = SchedulerConfig { executors }.validate().unwrap_err();
    assert!(err.contains("broken"));
}

#[test]
fn test_scheduler_config_from_json() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{
            "executors": {
                "io": { "capacity": 16 },
                "cpu": { "capacity": 2, "runtime": { "dedicated": { "worker_threads": 2 } } },
                "defaulted": {}
            }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.executors["io"].capacity, 16);
    assert_eq!(cfg.executors["io"].runtime, RuntimeConfig::Current);
    assert_eq!(
        cfg.executors["cpu"].runtime,
        RuntimeConfig::Dedicated { worker_threads: 2 }
    );
    assert_eq!(cfg.executors["defaulted"], ExecutorConfig::default());
}

#[test]
fn test_scheduler_config_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "executors": {} }"#).is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "executors": { "a": { "capacity": 0 } } }"#).is_err());
}
