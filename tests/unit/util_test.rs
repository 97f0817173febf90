//! Tests for utility functions

use prometheus_task_executor::util::{init_tracing, init_tracing_with_default, SubscriptionId, TaskId};

#[test]
fn test_ids() {
    let task: TaskId = 12345;
    let sub: SubscriptionId = 7;
    assert_eq!(task, 12345);
    assert_eq!(sub, 7);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing_with_default("prometheus_task_executor=debug");
    init_tracing();
    init_tracing_with_default("warn");
    tracing::info!("tracing initialized");
}
