//! Tests for tokio spawner utilities and API models

use prometheus_task_executor::config::{ExecutorConfig, SchedulerConfig};
use prometheus_task_executor::core::{Spawn, Task, TaskExecutor};
use prometheus_task_executor::runtime::api::{health, list_executors, status, status_all};
use prometheus_task_executor::runtime::tokio_spawner::TokioSpawner;
use std::collections::HashMap;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_spawner_current_outside_runtime() {
    assert!(TokioSpawner::current().is_err());
}

#[test]
fn test_dedicated_spawner_runs_tasks() {
    let spawner = TokioSpawner::with_worker_threads(1).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send(7).unwrap();
    });
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
}

#[tokio::test]
async fn test_status_reports_usage() {
    let executor = TaskExecutor::new(4).unwrap().named("api");
    executor
        .push(
            Task::from_fn(|_| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(serde_json::Value::Null)
            }),
            vec![],
            3,
        )
        .await
        .unwrap();

    let resp = status(&executor);
    assert_eq!(resp.snapshot.name, "api");
    assert_eq!(resp.used, 3);
    assert_eq!(resp.in_flight, 1);

    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["free"], 1);
    assert_eq!(json["used"], 3);

    executor.finish().await;
    let resp = status(&executor);
    assert_eq!(resp.used, 0);
    assert_eq!(resp.in_flight, 0);
}

#[tokio::test]
async fn test_status_all_sorted() {
    let mut executors = HashMap::new();
    for name in ["b", "a", "c"] {
        executors.insert(name.to_string(), TaskExecutor::new(1).unwrap().named(name));
    }
    let names: Vec<_> = status_all(&executors)
        .into_iter()
        .map(|s| s.snapshot.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn test_list_executors_sorted() {
    let mut executors = HashMap::new();
    executors.insert("z".to_string(), ExecutorConfig::default());
    executors.insert("m".to_string(), ExecutorConfig { capacity: 9, ..ExecutorConfig::default() });
    let listings = list_executors(&SchedulerConfig { executors });
    assert_eq!(listings[0].name, "m");
    assert_eq!(listings[0].capacity, 9);
    assert_eq!(listings[1].name, "z");
}

#[test]
fn test_health() {
    assert!(health().ok);
}

#[tokio::test]
async fn test_dedicated_spawner_dropped_in_async_context() {
    let spawner = TokioSpawner::with_worker_threads(1).unwrap();
    let clone = spawner.clone();
    let (tx, rx) = tokio::sync::oneshot::channel();
    clone.spawn(async move {
        tx.send(11).unwrap();
    });
    assert_eq!(rx.await.unwrap(), 11);

    drop(clone);
    drop(spawner);
}
