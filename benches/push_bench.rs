//! Benchmarks for the task executor.
//!
//! Benchmarks cover:
//! - Slot ledger admit/release
//! - Event fan-out to listeners
//! - End-to-end push throughput under saturation

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use prometheus_task_executor::core::{
    EventChannel, EventKind, ExecutorEvent, SlotLedger, Task, TaskExecutor,
};
use serde_json::Value;
use tokio::runtime::Runtime;

// ============================================================================
// Ledger
// ============================================================================

fn bench_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger");

    for capacity in [1_u32, 16, 256] {
        group.throughput(Throughput::Elements(u64::from(capacity)));
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let mut ledger = SlotLedger::new(capacity).unwrap();
                    for _ in 0..capacity {
                        black_box(ledger.admit(1));
                    }
                    for _ in 0..capacity {
                        ledger.release(1);
                    }
                    black_box(ledger.snapshot())
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Events
// ============================================================================

fn bench_event_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_fanout");

    for listeners in [1_usize, 8, 64] {
        let channel = EventChannel::new();
        for _ in 0..listeners {
            channel.on(EventKind::TaskSuccess, |ev| {
                black_box(ev);
            });
        }
        let event = ExecutorEvent::TaskSuccess {
            task_id: 1,
            output: Value::Null,
        };

        group.bench_with_input(BenchmarkId::from_parameter(listeners), &listeners, |b, _| {
            b.iter(|| black_box(channel.emit(&event)));
        });
    }
    group.finish();
}

// ============================================================================
// Push throughput
// ============================================================================

fn noop_task() -> Task {
    Task::from_fn(|_| async { Ok(Value::Null) })
}

fn bench_push_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_throughput");
    group.sample_size(20);

    for task_count in [100_u64, 1_000] {
        for capacity in [1_u32, 4, 16] {
            group.throughput(Throughput::Elements(task_count));
            group.bench_with_input(
                BenchmarkId::new(format!("capacity_{capacity}"), task_count),
                &(capacity, task_count),
                |b, &(capacity, task_count)| {
                    b.to_async(Runtime::new().unwrap()).iter(|| async move {
                        let executor = TaskExecutor::new(capacity).unwrap();
                        for _ in 0..task_count {
                            executor.push_one(noop_task(), vec![]).await.unwrap();
                        }
                        executor.finish().await;
                        black_box(executor.done_count())
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(ledger_benches, bench_ledger);
criterion_group!(event_benches, bench_event_fanout);
criterion_group!(executor_benches, bench_push_throughput);

criterion_main!(ledger_benches, event_benches, executor_benches);
