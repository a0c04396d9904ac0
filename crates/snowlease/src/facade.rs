use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    generator::LockSnowflakeGenerator,
    id::{SnowflakeId, SnowflakeLeaseId},
    lease::{LeaseConfig, LeaseRenewal, acquire_lease_for},
    store::CoordinationStore,
    time::{SystemClock, TimeSource},
};

/// The caller-facing surface of a generator: issue IDs, report the worker ID.
pub trait IdGenerator<ID: SnowflakeId> {
    /// Issues the next ID.
    ///
    /// # Errors
    ///
    /// Implementation specific; see [`LeasedSnowflakeGenerator::next`].
    fn next(&self) -> Result<ID>;

    /// The worker ID embedded in every issued ID.
    fn worker_id(&self) -> u64;
}

/// A Snowflake generator whose worker ID is leased from a
/// [`CoordinationStore`].
///
/// Construction leases the lowest free worker ID, builds a
/// [`LockSnowflakeGenerator`] around it and spawns a [`LeaseRenewal`] task. The
/// worker ID never changes for the lifetime of the generator. Dropping the
/// generator (or calling [`Self::shutdown`]) stops renewal; the lease then
/// expires on its own.
///
/// # Example
///
/// ```
/// use snowlease::{LeaseConfig, LeasedSnowflakeGenerator, MemoryStore, SnowflakeLeaseId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> snowlease::Result<()> {
/// let store = MemoryStore::new();
/// let generator: LeasedSnowflakeGenerator<SnowflakeLeaseId> =
///     LeasedSnowflakeGenerator::new(store, LeaseConfig::default()).await?;
///
/// let id = generator.next()?;
/// assert_eq!(id.worker_id(), generator.worker_id());
/// generator.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct LeasedSnowflakeGenerator<ID = SnowflakeLeaseId, T = SystemClock>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    generator: LockSnowflakeGenerator<ID, T>,
    renewal: LeaseRenewal,
    worker_id: u64,
    lease_key: String,
}

impl<ID> LeasedSnowflakeGenerator<ID, SystemClock>
where
    ID: SnowflakeId,
{
    /// Leases a worker ID and starts a generator on the system clock with the
    /// [`DEFAULT_EPOCH`].
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `config` is unusable with layout `ID`.
    /// - [`Error::LeasingFailed`] if no worker ID could be leased.
    ///
    /// [`DEFAULT_EPOCH`]: crate::DEFAULT_EPOCH
    pub async fn new<S: CoordinationStore>(store: S, config: LeaseConfig) -> Result<Self> {
        Self::with_clock(store, config, SystemClock::default()).await
    }
}

impl<ID, T> LeasedSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    /// Like [`LeasedSnowflakeGenerator::new`], with a custom time source.
    ///
    /// # Errors
    ///
    /// Same as [`LeasedSnowflakeGenerator::new`].
    pub async fn with_clock<S: CoordinationStore>(
        store: S,
        config: LeaseConfig,
        clock: T,
    ) -> Result<Self> {
        Self::with_clock_and_token(store, config, clock, CancellationToken::new()).await
    }

    /// Like [`Self::with_clock`]; renewal also stops when `token` is
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Same as [`LeasedSnowflakeGenerator::new`].
    pub async fn with_clock_and_token<S: CoordinationStore>(
        store: S,
        config: LeaseConfig,
        clock: T,
        token: CancellationToken,
    ) -> Result<Self> {
        let lease = acquire_lease_for::<ID, S>(&store, &config).await?;
        let generator = LockSnowflakeGenerator::new(lease.worker_id, clock);
        let renewal = LeaseRenewal::spawn_with_token(store, &lease, &config, token);

        Ok(Self {
            generator,
            renewal,
            worker_id: lease.worker_id,
            lease_key: lease.key,
        })
    }
}

impl<ID, T> LeasedSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    /// Issues the next ID.
    ///
    /// Blocks the calling thread (spinning) in the rare case the current
    /// millisecond's sequence space is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::LeaseLost`] if the lease could not be kept alive.
    /// - [`Error::ClockRegression`] if the clock went backwards.
    pub fn next(&self) -> Result<ID> {
        if self.renewal.is_lost() {
            return Err(Error::LeaseLost {
                worker_id: self.worker_id,
            });
        }
        self.generator.try_next_id()
    }

    /// The leased worker ID.
    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }

    /// The store key holding this generator's lease.
    pub fn lease_key(&self) -> &str {
        &self.lease_key
    }

    pub fn is_lease_lost(&self) -> bool {
        self.renewal.is_lost()
    }

    /// Stops lease renewal and waits for the task to exit. The lease record
    /// is left to expire.
    pub async fn shutdown(self) {
        self.renewal.shutdown().await;
    }
}

impl<ID, T> IdGenerator<ID> for LeasedSnowflakeGenerator<ID, T>
where
    ID: SnowflakeId,
    T: TimeSource,
{
    fn next(&self) -> Result<ID> {
        Self::next(self)
    }

    fn worker_id(&self) -> u64 {
        self.worker_id
    }
}
