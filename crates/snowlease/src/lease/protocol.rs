use tokio::time::Instant;
use tracing::instrument;

use crate::{
    error::{Error, Result},
    id::{SnowflakeId, SnowflakeLeaseId},
    lease::{LeaseConfig, StoreLock},
    store::{CoordinationStore, StoreError},
};

/// A worker ID claimed in the coordination store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    /// The claimed worker ID.
    pub worker_id: u64,
    /// The store key holding the lease record.
    pub key: String,
    /// Taken just before the lease record was created. The record expires no
    /// earlier than `acquired_at + lease_ttl`.
    pub acquired_at: Instant,
}

/// Why a single leasing attempt did not produce a lease.
#[derive(Clone, Debug, PartialEq, Eq)]
enum AttemptError {
    LockBusy,
    PoolExhausted,
    ClaimRaced { worker_id: u64 },
    Store(StoreError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Leases the lowest free worker ID for the [`SnowflakeLeaseId`] layout and
/// returns it.
///
/// See [`acquire_lease`].
///
/// # Errors
///
/// Same as [`acquire_lease`].
pub async fn acquire_worker_id<S: CoordinationStore>(store: &S, config: &LeaseConfig) -> Result<u64> {
    acquire_lease(store, config).await.map(|lease| lease.worker_id)
}

/// [`acquire_lease_for`] with the default [`SnowflakeLeaseId`] layout.
///
/// # Errors
///
/// Same as [`acquire_lease_for`].
pub async fn acquire_lease<S: CoordinationStore>(store: &S, config: &LeaseConfig) -> Result<Lease> {
    acquire_lease_for::<SnowflakeLeaseId, S>(store, config).await
}

/// Negotiates an exclusive worker ID with the coordination store, for IDs of
/// layout `ID`.
///
/// Each attempt:
/// 1. takes the store lock at `lock_key` with a fresh token,
/// 2. reads every lease key in `0..=max_worker_id` in one batch,
/// 3. picks the lowest ID without a lease record,
/// 4. creates that record with `lease_ttl` via create-if-absent,
/// 5. releases the lock if it still holds this attempt's token.
///
/// The scan in step 2 is only a hint. Step 4's create-if-absent is what
/// actually guarantees exclusivity, so a concurrent claim that slips past the
/// lock makes the attempt fail rather than share the ID. Attempts are spaced by
/// `retry_delay`.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if `config` does not validate, including a
///   `max_worker_id` that does not fit the worker field of `ID`. Nothing is
///   written to the store in that case.
/// - [`Error::LeasingFailed`] once `max_attempts` attempts failed.
#[instrument(skip_all, fields(lock_key = %config.lock_key, max_worker_id = config.max_worker_id))]
pub async fn acquire_lease_for<ID, S>(store: &S, config: &LeaseConfig) -> Result<Lease>
where
    ID: SnowflakeId,
    S: CoordinationStore,
{
    config.validate_for::<ID>()?;

    for attempt in 1..=config.max_attempts {
        match lease_once(store, config).await {
            Ok(lease) => {
                tracing::info!(attempt, worker_id = lease.worker_id, "leased worker ID");
                return Ok(lease);
            }
            Err(AttemptError::LockBusy) => {
                tracing::warn!(attempt, "failed to acquire lock");
            }
            Err(AttemptError::PoolExhausted) => {
                tracing::warn!(attempt, "no available worker ID found");
            }
            Err(AttemptError::ClaimRaced { worker_id }) => {
                tracing::warn!(attempt, worker_id, "failed to register worker ID, already claimed");
            }
            Err(AttemptError::Store(e)) => {
                tracing::warn!(attempt, error = %e, "store error while leasing");
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.retry_delay).await;
        }
    }

    tracing::error!(
        attempts = config.max_attempts,
        "failed to acquire lock and register worker ID after maximum retries"
    );
    Err(Error::LeasingFailed {
        attempts: config.max_attempts,
    })
}

/// One locked scan-and-claim round. The lock is released whatever happens
/// after it was taken.
async fn lease_once<S: CoordinationStore>(
    store: &S,
    config: &LeaseConfig,
) -> core::result::Result<Lease, AttemptError> {
    let Some(lock) = StoreLock::try_acquire(store, &config.lock_key, config.lock_ttl).await? else {
        return Err(AttemptError::LockBusy);
    };

    let outcome = scan_and_claim(store, config).await;

    if let Err(e) = lock.release_if_owned(store).await {
        tracing::warn!(error = %e, "error releasing lock");
    }
    outcome
}

async fn scan_and_claim<S: CoordinationStore>(
    store: &S,
    config: &LeaseConfig,
) -> core::result::Result<Lease, AttemptError> {
    let keys = config.worker_keys();
    let values = store.batch_get(&keys).await?;
    if values.len() != keys.len() {
        return Err(AttemptError::Store(StoreError::Operation {
            key: config.worker_key(0),
            reason: format!("batch get returned {} values for {} keys", values.len(), keys.len()),
        }));
    }

    let claimed: Vec<bool> = values.iter().map(Option::is_some).collect();
    let Some(worker_id) = lowest_free(&claimed) else {
        return Err(AttemptError::PoolExhausted);
    };

    let key = config.worker_key(worker_id);
    let acquired_at = Instant::now();
    if store
        .create_if_absent(&key, &worker_id.to_string(), config.lease_ttl)
        .await?
    {
        Ok(Lease {
            worker_id,
            key,
            acquired_at,
        })
    } else {
        Err(AttemptError::ClaimRaced { worker_id })
    }
}

/// Index of the first unclaimed slot. Lowest-first keeps the claimed set dense.
pub(crate) fn lowest_free(claimed: &[bool]) -> Option<u64> {
    claimed
        .iter()
        .position(|taken| !taken)
        .map(|idx| idx as u64)
}
