use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread::scope,
};

use crate::{
    Error, IdGenStatus, LockSnowflakeGenerator, SnowflakeGenerator, SnowflakeId, SnowflakeLeaseId,
    SystemClock, TimeSource,
};

struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// A clock whose reading is moved by the test.
#[derive(Clone)]
struct SharedMockStepTime {
    clock: Arc<MockStepTime>,
}

struct MockStepTime {
    values: Vec<u64>,
    index: AtomicUsize,
}

impl SharedMockStepTime {
    fn new(values: Vec<u64>) -> Self {
        Self {
            clock: Arc::new(MockStepTime {
                values,
                index: AtomicUsize::new(0),
            }),
        }
    }

    fn step_to(&self, index: usize) {
        self.clock.index.store(index, Ordering::SeqCst);
    }
}

impl TimeSource for SharedMockStepTime {
    fn current_millis(&self) -> u64 {
        self.clock.values[self.clock.index.load(Ordering::SeqCst)]
    }
}

/// Advances one millisecond every `reads_per_tick` reads. Lets the blocking
/// path leave an exhausted millisecond deterministically.
struct TickingTime {
    start: u64,
    reads_per_tick: u64,
    reads: AtomicU64,
}

impl TickingTime {
    fn new(start: u64, reads_per_tick: u64) -> Self {
        Self {
            start,
            reads_per_tick,
            reads: AtomicU64::new(0),
        }
    }
}

impl TimeSource for TickingTime {
    fn current_millis(&self) -> u64 {
        let reads = self.reads.fetch_add(1, Ordering::SeqCst);
        self.start + reads / self.reads_per_tick
    }
}

trait IdGenStatusExt<T>
where
    T: SnowflakeId,
{
    fn unwrap_ready(self) -> T;
    fn unwrap_pending(self) -> u64;
}

impl<T> IdGenStatusExt<T> for IdGenStatus<T>
where
    T: SnowflakeId,
{
    fn unwrap_ready(self) -> T {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => {
                panic!("unexpected pending (yield for: {yield_for})")
            }
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

fn run_id_sequence_increments_within_same_tick<G, ID, T>(generator: &G)
where
    G: SnowflakeGenerator<ID, T>,
    ID: SnowflakeId,
    T: TimeSource,
{
    let id1 = generator.try_poll_id().unwrap().unwrap_ready();
    let id2 = generator.try_poll_id().unwrap().unwrap_ready();
    let id3 = generator.try_next_id().unwrap();

    assert_eq!(id1.timestamp(), 42);
    assert_eq!(id2.timestamp(), 42);
    assert_eq!(id3.timestamp(), 42);
    assert_eq!(id1.sequence(), 0);
    assert_eq!(id2.sequence(), 1);
    assert_eq!(id3.sequence(), 2);
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn lock_generator_sequence_increments_within_same_tick() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1, MockTime { millis: 42 });
    run_id_sequence_increments_within_same_tick(&generator);
}

#[test]
fn new_timestamp_resets_sequence() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1, time.clone());

    generator.try_next_id().unwrap();
    generator.try_next_id().unwrap();
    time.step_to(1);
    let id = generator.try_next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
    assert_eq!(id.worker_id(), 1);
}

#[test]
fn poll_returns_pending_when_sequence_exhausted() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::from_components(
            0,
            1,
            SnowflakeLeaseId::max_sequence(),
            MockTime { millis: 0 },
        );
    let yield_for = generator.try_poll_id().unwrap().unwrap_pending();
    assert_eq!(yield_for, 1);
}

#[test]
fn poll_handles_rollover() {
    let time = SharedMockStepTime::new(vec![42, 43]);
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1, time.clone());

    for i in 0..=SnowflakeLeaseId::max_sequence() {
        let id = generator.try_poll_id().unwrap().unwrap_ready();
        assert_eq!(id.sequence(), i);
        assert_eq!(id.timestamp(), 42);
    }

    // The 4097th request in the same millisecond must not reuse a sequence.
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 1);

    time.step_to(1);
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
}

#[test]
fn next_id_waits_for_the_next_millisecond_when_exhausted() {
    // Each millisecond lasts far longer than the sequence space, so the
    // blocking path is forced to spin.
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(3, TickingTime::new(42, 10_000));

    let mut seen = HashSet::new();
    for i in 0..=SnowflakeLeaseId::max_sequence() {
        let id = generator.try_next_id().unwrap();
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.sequence(), i);
        assert!(seen.insert(id));
    }

    let id = generator.try_next_id().unwrap();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.sequence(), 0);
    assert!(seen.insert(id));
}

#[test]
fn clock_regression_is_an_error_not_an_id() {
    let time = SharedMockStepTime::new(vec![100, 95, 100, 101]);
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1, time.clone());

    let first = generator.try_next_id().unwrap();

    time.step_to(1);
    assert_eq!(
        generator.try_next_id(),
        Err(Error::ClockRegression {
            last_timestamp: 100,
            now: 95
        })
    );
    assert!(matches!(
        generator.try_poll_id(),
        Err(Error::ClockRegression { .. })
    ));

    // State was not disturbed by the failed calls.
    time.step_to(2);
    let second = generator.try_next_id().unwrap();
    assert_eq!(second.sequence(), 1);
    assert!(second > first);

    time.step_to(3);
    let third = generator.try_next_id().unwrap();
    assert_eq!((third.timestamp(), third.sequence()), (101, 0));
}

/// Reads `first` once, then `rest` forever.
struct RegressAfterFirstRead {
    first: u64,
    rest: u64,
    reads: AtomicUsize,
}

impl TimeSource for RegressAfterFirstRead {
    fn current_millis(&self) -> u64 {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            self.first
        } else {
            self.rest
        }
    }
}

#[test]
fn clock_regression_while_waiting_is_reported() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::from_components(
            50,
            1,
            SnowflakeLeaseId::max_sequence(),
            RegressAfterFirstRead {
                first: 50,
                rest: 49,
                reads: AtomicUsize::new(0),
            },
        );

    assert_eq!(
        generator.try_next_id(),
        Err(Error::ClockRegression {
            last_timestamp: 50,
            now: 49
        })
    );
}

#[test]
fn frozen_clock_ends_the_wait_with_an_error() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::from_components(
            7,
            1,
            SnowflakeLeaseId::max_sequence(),
            MockTime { millis: 7 },
        );

    assert_eq!(
        generator.try_next_id(),
        Err(Error::ClockStalled { timestamp: 7 })
    );
    // Nothing was issued; the millisecond is still exhausted.
    assert_eq!(generator.try_poll_id().unwrap().unwrap_pending(), 1);
}

#[test]
fn generator_is_monotonic_on_the_system_clock() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(5, SystemClock::default());

    let mut last = generator.try_next_id().unwrap();
    for _ in 0..4096 * 16 {
        let id = generator.try_next_id().unwrap();
        assert!(id > last, "{id:?} <= {last:?}");
        assert_eq!(id.worker_id(), 5);
        last = id;
    }
}

#[test]
fn generator_is_unique_across_threads() {
    const THREADS: usize = 8;
    const TOTAL_IDS: usize = 4096 * 64;
    const IDS_PER_THREAD: usize = TOTAL_IDS / THREADS;

    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(9, SystemClock::default());

    let per_thread: Vec<Vec<SnowflakeLeaseId>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = generator.clone();
                s.spawn(move || {
                    let mut ids = Vec::with_capacity(IDS_PER_THREAD);
                    for _ in 0..IDS_PER_THREAD {
                        ids.push(generator.try_next_id().unwrap());
                    }
                    ids
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::with_capacity(TOTAL_IDS);
    for ids in per_thread {
        // Calls within one thread are ordered by the mutex.
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for id in ids {
            assert!(seen.insert(id));
        }
    }
    assert_eq!(seen.len(), TOTAL_IDS);
}

#[test]
fn contended_rollovers_never_report_a_regression() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 20_000;

    // The clock moves forward every few reads, so nearly every call races a
    // rollover performed by another thread.
    let time = Arc::new(TickingTime::new(1_000, 3));
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(2, Arc::clone(&time));

    let per_thread: Vec<Vec<SnowflakeLeaseId>> = scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = generator.clone();
                s.spawn(move || {
                    (0..IDS_PER_THREAD)
                        .map(|_| generator.try_next_id().unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut seen = HashSet::with_capacity(THREADS * IDS_PER_THREAD);
    for ids in per_thread {
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for id in ids {
            assert!(seen.insert(id));
        }
    }
}

#[test]
fn worker_id_is_fixed() {
    let generator: LockSnowflakeGenerator<SnowflakeLeaseId, _> =
        LockSnowflakeGenerator::new(1023, MockTime { millis: 7 });
    assert_eq!(generator.worker_id(), 1023);
    assert_eq!(generator.try_next_id().unwrap().worker_id(), 1023);
}
