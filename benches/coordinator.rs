//! Benchmarks for graceful components.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use graceful::util::{FireOnce, WorkerGroup};
use graceful::{Manager, NoopLogger, Options, SignalSet};
use std::time::Duration;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

/// A finished manager holding `failures` recorded failures.
fn finished_manager(runtime: &tokio::runtime::Runtime, failures: usize) -> Manager {
    runtime.block_on(async {
        let manager = Manager::standalone(
            Options::new()
                .with_logger(NoopLogger)
                .with_signals(SignalSet::empty())
                .with_shutdown_timeout(Duration::ZERO),
        );
        for i in 0..failures {
            manager.add_running_job(move |_| async move { Err(anyhow::anyhow!("job {i} failed")) });
        }
        manager.shutdown();
        manager.done().await;
        manager
    })
}

fn benchmark_fire_once(c: &mut Criterion) {
    let guard = FireOnce::new();
    guard.call_once(|| {});

    c.bench_function("fire_once_after_fired", |b| {
        b.iter(|| {
            black_box(guard.call_once(|| {}));
        })
    });
}

fn benchmark_errors_snapshot(c: &mut Criterion) {
    let runtime = create_runtime();
    let mut group = c.benchmark_group("errors_snapshot");

    for failures in [1usize, 100, 1000] {
        let manager = finished_manager(&runtime, failures);
        group.throughput(Throughput::Elements(failures as u64));
        group.bench_with_input(BenchmarkId::from_parameter(failures), &manager, |b, m| {
            b.iter(|| {
                black_box(m.errors());
            })
        });
    }

    group.finish();
}

fn benchmark_worker_group(c: &mut Criterion) {
    let runtime = create_runtime();
    let mut group = c.benchmark_group("worker_group");

    for tasks in [10usize, 100] {
        group.throughput(Throughput::Elements(tasks as u64));
        group.bench_with_input(BenchmarkId::new("spawn_and_wait", tasks), &tasks, |b, &n| {
            b.iter(|| {
                runtime.block_on(async {
                    let workers = WorkerGroup::current();
                    for _ in 0..n {
                        workers.spawn(async {
                            tokio::task::yield_now().await;
                        });
                    }
                    workers.wait().await;
                })
            })
        });
    }

    group.finish();
}

fn benchmark_teardown(c: &mut Criterion) {
    let runtime = create_runtime();

    c.bench_function("teardown_10_running_10_shutdown", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let manager = Manager::standalone(
                    Options::new()
                        .with_logger(NoopLogger)
                        .with_signals(SignalSet::empty()),
                );
                for _ in 0..10 {
                    manager.add_running_job(|token| async move {
                        token.cancelled().await;
                        Ok(())
                    });
                    manager.add_shutdown_job(|| async { Ok(()) });
                }
                manager.shutdown();
                manager.done().await;
            })
        })
    });
}

criterion_group!(
    benches,
    benchmark_fire_once,
    benchmark_errors_snapshot,
    benchmark_worker_group,
    benchmark_teardown,
);

criterion_main!(benches);
