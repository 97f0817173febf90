//! Tests for builder modules

use prometheus_task_executor::builders::{build_executor, build_executors, build_executors_with};
use prometheus_task_executor::config::{ExecutorConfig, RuntimeConfig, SchedulerConfig};
use prometheus_task_executor::core::{SchedulerError, Spawn};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn scheduler_config() -> SchedulerConfig {
    let mut executors = HashMap::new();
    executors.insert(
        "io".to_string(),
        ExecutorConfig {
            capacity: 8,
            runtime: RuntimeConfig::Current,
        },
    );
    executors.insert(
        "cpu".to_string(),
        ExecutorConfig {
            capacity: 2,
            runtime: RuntimeConfig::Current,
        },
    );
    SchedulerConfig { executors }
}

/// Spawner that counts spawns and forwards them to the ambient runtime.
#[derive(Clone, Default)]
struct CountingSpawner {
    spawned: Arc<AtomicUsize>,
}

impl Spawn for CountingSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(fut);
    }
}

#[tokio::test]
async fn test_build_executor_from_config() {
    let executor = build_executor("io", &ExecutorConfig::default()).unwrap();
    assert_eq!(executor.name(), "io");
    assert_eq!(executor.capacity(), 4);
    assert_eq!(executor.free(), 4);
}

#[tokio::test]
async fn test_build_executor_rejects_invalid_config() {
    let cfg = ExecutorConfig {
        capacity: 0,
        runtime: RuntimeConfig::Current,
    };
    let err = build_executor("bad", &cfg).err().unwrap();
    assert!(matches!(err, SchedulerError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_build_executors() {
    let executors = build_executors(&scheduler_config()).unwrap();
    assert_eq!(executors.len(), 2);
    assert_eq!(executors["io"].capacity(), 8);
    assert_eq!(executors["cpu"].capacity(), 2);
    assert_eq!(executors["cpu"].name(), "cpu");
}

#[tokio::test]
async fn test_build_executors_with_custom_spawner() {
    let spawner = CountingSpawner::default();
    let executors = build_executors_with(&scheduler_config(), |_, _| Ok(spawner.clone())).unwrap();

    let executor = &executors["io"];
    for _ in 0..3 {
        executor
            .push_one(
                prometheus_task_executor::core::Task::from_fn(|_| async {
                    Ok(serde_json::Value::Null)
                }),
                vec![],
            )
            .await
            .unwrap();
    }
    executor.finish().await;

    assert_eq!(spawner.spawned.load(Ordering::SeqCst), 3);
    assert_eq!(executor.done_count(), 3);
}

#[tokio::test]
async fn test_build_executors_propagates_factory_error() {
    let err = build_executors_with::<CountingSpawner, _>(&scheduler_config(), |_, _| {
        Err(SchedulerError::Runtime("unavailable".into()))
    })
    .err()
    .unwrap();
    assert_eq!(err, SchedulerError::Runtime("unavailable".into()));
}

#[test]
fn test_build_dedicated_runtime_executor() {
    let cfg = ExecutorConfig {
        capacity: 2,
        runtime: RuntimeConfig::Dedicated { worker_threads: 1 },
    };
    let executor = build_executor("dedicated", &cfg).unwrap();
    assert_eq!(executor.capacity(), 2);
}

#[tokio::test]
async fn test_dedicated_executor_dropped_in_async_context() {
    let cfg = ExecutorConfig {
        capacity: 2,
        runtime: RuntimeConfig::Dedicated { worker_threads: 1 },
    };
    let executor = build_executor("dedicated", &cfg).unwrap();
    executor
        .push_one(
            prometheus_task_executor::core::Task::from_fn(|_| async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok(serde_json::json!("ok"))
            }),
            vec![],
        )
        .await
        .unwrap();
    executor.finish().await;
    assert_eq!(executor.done_count(), 1);

    drop(executor);
}
