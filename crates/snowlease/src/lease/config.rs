use core::time::Duration;

use crate::{
    error::{Error, Result},
    id::{SnowflakeId, SnowflakeLeaseId},
};

/// What the renewal loop does when it can no longer prove the lease is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenewalPolicy {
    /// Keep issuing IDs and keep retrying the refresh. Failures are only
    /// logged, so an expired lease may be re-leased by another node while this
    /// one still uses the worker ID.
    FailOpen,
    /// Stop issuing IDs once the lease may have expired: either a full
    /// `lease_ttl` passed without a successful refresh, or the store reports
    /// the lease key missing.
    #[default]
    FailClosed,
}

/// Tunables for leasing a worker ID and keeping it.
///
/// Defaults match a deployment where each lease lives 30 seconds and is
/// renewed every 15.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseConfig {
    /// Namespace of lease keys; worker `n` is stored under `<prefix>-<n>`.
    pub key_prefix: String,
    /// The single well-known lock key guarding scan-and-claim.
    pub lock_key: String,
    /// Time-to-live of a lease record.
    pub lease_ttl: Duration,
    /// Time-to-live of the negotiation lock.
    pub lock_ttl: Duration,
    /// How often the renewal loop refreshes the lease. Must be below
    /// `lease_ttl`.
    pub renew_interval: Duration,
    /// Leasing attempts before giving up.
    pub max_attempts: u32,
    /// Pause between leasing attempts.
    pub retry_delay: Duration,
    /// Highest worker ID that may be leased (inclusive).
    pub max_worker_id: u64,
    pub renewal_policy: RenewalPolicy,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            key_prefix: String::from("snowflake:worker"),
            lock_key: String::from("snowflake:lock"),
            lease_ttl: Duration::from_secs(30),
            lock_ttl: Duration::from_secs(10),
            renew_interval: Duration::from_secs(15),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            max_worker_id: SnowflakeLeaseId::max_worker_id(),
            renewal_policy: RenewalPolicy::default(),
        }
    }
}

impl LeaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    #[must_use]
    pub fn with_lock_key(mut self, lock_key: impl Into<String>) -> Self {
        self.lock_key = lock_key.into();
        self
    }

    /// Sets the lease TTL and keeps the renew interval at half of it.
    #[must_use]
    pub fn with_lease_ttl(mut self, lease_ttl: Duration) -> Self {
        self.lease_ttl = lease_ttl;
        self.renew_interval = lease_ttl / 2;
        self
    }

    #[must_use]
    pub const fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    #[must_use]
    pub const fn with_renew_interval(mut self, renew_interval: Duration) -> Self {
        self.renew_interval = renew_interval;
        self
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub const fn with_max_worker_id(mut self, max_worker_id: u64) -> Self {
        self.max_worker_id = max_worker_id;
        self
    }

    #[must_use]
    pub const fn with_renewal_policy(mut self, renewal_policy: RenewalPolicy) -> Self {
        self.renewal_policy = renewal_policy;
        self
    }

    /// The lease key for `worker_id`.
    pub fn worker_key(&self, worker_id: u64) -> String {
        format!("{}-{}", self.key_prefix, worker_id)
    }

    /// Every lease key in `0..=max_worker_id`, in worker ID order.
    pub fn worker_keys(&self) -> Vec<String> {
        (0..=self.max_worker_id)
            .map(|id| self.worker_key(id))
            .collect()
    }

    /// Checks that the parameters can work together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.key_prefix.is_empty() {
            return invalid("key_prefix must not be empty");
        }
        if self.lock_key.is_empty() {
            return invalid("lock_key must not be empty");
        }
        if self.lock_key.starts_with(&format!("{}-", self.key_prefix)) {
            return invalid(format!(
                "lock_key {:?} falls inside the worker key namespace {:?}",
                self.lock_key, self.key_prefix
            ));
        }
        if self.lease_ttl.is_zero() || self.lock_ttl.is_zero() {
            return invalid("lease_ttl and lock_ttl must be non-zero");
        }
        if self.renew_interval.is_zero() || self.renew_interval >= self.lease_ttl {
            return invalid(format!(
                "renew_interval ({:?}) must be non-zero and shorter than lease_ttl ({:?})",
                self.renew_interval, self.lease_ttl
            ));
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1");
        }
        Ok(())
    }

    /// [`Self::validate`], plus a check that every leasable worker ID fits the
    /// worker field of `ID`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first problem found.
    pub fn validate_for<ID: SnowflakeId>(&self) -> Result<()> {
        self.validate()?;
        if self.max_worker_id > ID::max_worker_id() {
            return invalid(format!(
                "max_worker_id ({}) exceeds the layout's worker ID space (max = {})",
                self.max_worker_id,
                ID::max_worker_id()
            ));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> Result<()> {
    Err(Error::InvalidConfig {
        reason: reason.into(),
    })
}
