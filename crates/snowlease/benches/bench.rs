use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use snowlease::{
    LeaseConfig, LeasedSnowflakeGenerator, LockSnowflakeGenerator, MemoryStore, SnowflakeLeaseId,
    SystemClock, TimeSource, encode,
};
use std::{
    sync::Barrier,
    thread::scope,
    time::Instant,
};
use tokio::runtime::Builder;

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded). Matches one millisecond of sequence space.
const TOTAL_IDS: usize = 4096;

/// Hot path: a fixed clock never leaves the first millisecond, so every call
/// takes the increment branch.
fn benchmark_mock_sequential_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock/sequential/lock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();
            for _ in 0..iters {
                let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
                    LockSnowflakeGenerator::new(1, FixedMockTime { millis: 1 });
                for _ in 0..TOTAL_IDS {
                    black_box(generator.try_next_id().unwrap());
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

/// Wall clock, including the occasional wait for the next millisecond.
fn benchmark_system_clock_sequential_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("system/sequential/lock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1, SystemClock::default());
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.try_next_id().unwrap());
            }
        });
    });
    group.finish();
}

fn benchmark_system_clock_contended_lock(c: &mut Criterion) {
    let mut group = c.benchmark_group("system/contended/lock");
    for threads in [2, 4, 8] {
        group.throughput(Throughput::Elements((threads * TOTAL_IDS) as u64));
        group.bench_function(format!("threads/{threads}/elems/{TOTAL_IDS}"), |b| {
            b.iter_custom(|iters| {
                let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
                    LockSnowflakeGenerator::new(1, SystemClock::default());
                let start = Instant::now();
                for _ in 0..iters {
                    let barrier = Barrier::new(threads);
                    scope(|s| {
                        for _ in 0..threads {
                            let generator = generator.clone();
                            let barrier = &barrier;
                            s.spawn(move || {
                                barrier.wait();
                                for _ in 0..TOTAL_IDS {
                                    black_box(generator.try_next_id().unwrap());
                                }
                            });
                        }
                    });
                }
                start.elapsed()
            });
        });
    }
    group.finish();
}

/// The facade adds a lease liveness check in front of the local generator.
fn benchmark_leased_facade(c: &mut Criterion) {
    let runtime = Builder::new_multi_thread()
        .enable_time()
        .build()
        .expect("failed to build runtime");
    let generator: LeasedSnowflakeGenerator = runtime
        .block_on(LeasedSnowflakeGenerator::new(
            MemoryStore::new(),
            LeaseConfig::default(),
        ))
        .expect("failed to lease a worker ID");

    let mut group = c.benchmark_group("system/sequential/leased");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));
    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter(|| {
            for _ in 0..TOTAL_IDS {
                black_box(generator.next().unwrap());
            }
        });
    });
    group.finish();
    runtime.block_on(generator.shutdown());
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));
    group.bench_function("encode", |b| {
        b.iter(|| encode(black_box(5), black_box(7), black_box(0)));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_mock_sequential_lock,
    benchmark_system_clock_sequential_lock,
    benchmark_system_clock_contended_lock,
    benchmark_leased_facade,
    benchmark_encode,
);
criterion_main!(benches);
