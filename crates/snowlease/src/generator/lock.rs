use core::{cmp::Ordering, time::Duration};
use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::{IdGenStatus, SnowflakeGenerator},
    id::SnowflakeId,
    time::TimeSource,
};

/// Spins before falling back to yielding the thread while waiting out an
/// exhausted millisecond.
const SPINS_BEFORE_YIELD: u32 = 64;

/// Longest wait for the clock to leave an exhausted millisecond before giving
/// up with [`Error::ClockStalled`].
const MAX_STALL: Duration = Duration::from_secs(1);

/// A lock-based Snowflake ID generator suitable for multi-threaded
/// environments.
///
/// The last issued ID doubles as the sequencer state (`timestamp`, `sequence`)
/// and lives behind an [`Arc<Mutex<_>>`]. Every call is serialized by that
/// mutex, including the rare wait for the next millisecond once 4096 IDs (with
/// the default layout) were issued in the current one. Other callers block on
/// the lock meanwhile; that is the price of never reusing a sequence value.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Reports clock regressions instead of issuing a duplicate
/// - ✅ Works with any [`SnowflakeId`] layout
pub struct LockSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    pub(crate) state: Arc<Mutex<ID>>,
    pub(crate) time: T,
}

impl<ID, T> Clone for LockSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            time: self.time.clone(),
        }
    }
}

impl<ID, T> LockSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    /// Creates a new generator for `worker_id`, with timestamp and sequence
    /// starting at zero.
    ///
    /// # Example
    /// ```
    /// use snowlease::{LockSnowflakeGenerator, SnowflakeId, SnowflakeLeaseId, SystemClock};
    ///
    /// let generator = LockSnowflakeGenerator::new(7, SystemClock::default());
    /// let id: SnowflakeLeaseId = generator.try_next_id().unwrap();
    /// assert_eq!(id.worker_id(), 7);
    /// ```
    pub fn new(worker_id: u64, time: T) -> Self {
        Self::from_components(0, worker_id, 0, time)
    }

    /// Creates a new ID generator from explicit component values.
    ///
    /// Useful for restoring a generator's position, or for tests that need a
    /// specific starting point.
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`Self::new`].
    pub fn from_components(timestamp: u64, worker_id: u64, sequence: u64, time: T) -> Self {
        let id = ID::from_components(timestamp, worker_id, sequence);
        Self {
            state: Arc::new(Mutex::new(id)),
            time,
        }
    }

    /// Returns the worker ID embedded in every issued ID.
    pub fn worker_id(&self) -> u64 {
        self.state.lock().worker_id()
    }

    /// Attempts to generate the next available ID without blocking.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: A new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: The current millisecond is
    ///   exhausted; try again after `yield_for` milliseconds
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   timestamp. State is left untouched.
    pub fn try_poll_id(&self) -> Result<IdGenStatus<ID>> {
        let mut id = self.state.lock();
        let now = self.time.current_millis();

        let current_ts = id.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *id })
                } else {
                    Ok(IdGenStatus::Pending { yield_for: 1 })
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *id })
            }
            Ordering::Less => Err(Self::cold_clock_behind(now, current_ts)),
        }
    }

    /// Generates the next ID, waiting out an exhausted millisecond.
    ///
    /// When the sequence overflows, this spins inside the critical section,
    /// polling the clock with [`core::hint::spin_loop`] and then
    /// [`std::thread::yield_now`] hints, until the clock moves past the
    /// exhausted millisecond. The new millisecond starts at sequence zero.
    /// The clock is read while holding the lock, so concurrent callers never
    /// compare against a reading older than the state they observe.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   timestamp, either on entry or while waiting.
    /// - [`Error::ClockStalled`] if the clock does not advance past an
    ///   exhausted millisecond within one second. State is left untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn try_next_id(&self) -> Result<ID> {
        let mut id = self.state.lock();
        let now = self.time.current_millis();

        let current_ts = id.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                } else {
                    let next = self.cold_wait_next_millis(current_ts)?;
                    *id = id.rollover_to_timestamp(next);
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
            }
            Ordering::Less => return Err(Self::cold_clock_behind(now, current_ts)),
        }
        Ok(*id)
    }

    /// Polls the clock until it reads past `exhausted_ts`.
    ///
    /// Exits as soon as the clock advances. A backward reading, or a clock
    /// that stays on `exhausted_ts` for [`MAX_STALL`], ends the wait with an
    /// error.
    #[cold]
    #[inline(never)]
    fn cold_wait_next_millis(&self, exhausted_ts: u64) -> Result<u64> {
        tracing::trace!(exhausted_ts, "sequence exhausted, waiting for next millisecond");
        let started = Instant::now();
        let mut spins: u32 = 0;
        loop {
            if spins < SPINS_BEFORE_YIELD {
                core::hint::spin_loop();
                spins += 1;
            } else {
                std::thread::yield_now();
                if started.elapsed() >= MAX_STALL {
                    return Err(Self::cold_clock_stalled(exhausted_ts));
                }
            }

            let now = self.time.current_millis();
            match now.cmp(&exhausted_ts) {
                Ordering::Greater => return Ok(now),
                Ordering::Equal => {}
                Ordering::Less => return Err(Self::cold_clock_behind(now, exhausted_ts)),
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_stalled(timestamp: u64) -> Error {
        tracing::error!(timestamp, "clock is not advancing, sequence stays exhausted");
        Error::ClockStalled { timestamp }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last_timestamp: u64) -> Error {
        tracing::warn!(
            now,
            last_timestamp,
            "clock is moving backwards, rejecting requests until {last_timestamp}"
        );
        Error::ClockRegression {
            last_timestamp,
            now,
        }
    }
}

impl<ID, T> SnowflakeGenerator<ID, T> for LockSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    fn new(worker_id: u64, time: T) -> Self {
        Self::new(worker_id, time)
    }

    fn worker_id(&self) -> u64 {
        self.worker_id()
    }

    fn try_poll_id(&self) -> Result<IdGenStatus<ID>> {
        self.try_poll_id()
    }

    fn try_next_id(&self) -> Result<ID> {
        self.try_next_id()
    }
}
