use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use foundation_threads::primitives::{AtomicInt64, CountdownLatch, Lock, ScopedLockGuard};
use foundation_threads::thread::ThreadHandle;
use std::sync::Arc;

/// Benchmark an uncontended scoped lock/unlock pair.
fn bench_lock_uncontended(c: &mut Criterion) {
    let lock = Lock::new();
    c.bench_function("scoped_lock_uncontended", |b| {
        b.iter(|| {
            let _guard = ScopedLockGuard::new(black_box(&lock));
        });
    });
}

/// Benchmark the atomic fetch-add path.
fn bench_atomic_increment(c: &mut Criterion) {
    let counter = AtomicInt64::new();
    c.bench_function("atomic_int64_increment_and_get", |b| {
        b.iter(|| black_box(counter.increment_and_get()));
    });
}

/// Benchmark start (including the tid handshake) plus join.
fn bench_thread_start_join(c: &mut Criterion) {
    c.bench_function("thread_handle_start_join", |b| {
        b.iter_batched(
            || ThreadHandle::new(|| {}),
            |mut handle| {
                handle.start().expect("should spawn");
                black_box(handle.tid());
                handle.join().expect("should join");
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark a latch of 4 released by 4 worker threads.
fn bench_latch_round_trip(c: &mut Criterion) {
    c.bench_function("countdown_latch_4_workers", |b| {
        b.iter_batched(
            || Arc::new(CountdownLatch::new(4)),
            |latch| {
                let mut workers: Vec<ThreadHandle> = (0..4)
                    .map(|_| {
                        let latch = Arc::clone(&latch);
                        ThreadHandle::new(move || latch.count_down())
                    })
                    .collect();

                for worker in &mut workers {
                    worker.start().expect("should spawn");
                }
                latch.wait();
                for worker in &mut workers {
                    worker.join().expect("should join");
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_lock_uncontended,
    bench_atomic_increment,
    bench_thread_start_join,
    bench_latch_round_trip
);
criterion_main!(benches);
