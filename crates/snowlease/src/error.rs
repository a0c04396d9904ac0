//! Error types for ID issuance and worker-ID leasing.
//!
//! ## Error Cases
//! - `ClockRegression`: the wall clock moved behind the last issued timestamp.
//!   Local and recoverable; retry once the clock reaches `last_timestamp`.
//! - `ClockStalled`: the sequence is exhausted and the clock stopped
//!   advancing. Retryable once the time source moves again.
//! - `LeasingFailed`: no worker ID could be leased within the configured
//!   attempts. Fatal to generator construction.
//! - `CoordinationStore`: a transport or operational failure talking to the
//!   shared store.
//! - `LeaseLost`: the renewal loop gave up on the current lease, so the worker
//!   ID may already belong to another node.
//! - `InvalidConfig`: leasing parameters that cannot work together.

use crate::store::StoreError;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `snowlease` can emit.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The clock reads `now`, which is behind the last issued timestamp.
    ///
    /// No ID is produced. Wait until the clock reaches `last_timestamp` before
    /// retrying.
    #[error("clock moved backwards: now {now} < last issued {last_timestamp}, wait until {last_timestamp}")]
    ClockRegression { last_timestamp: u64, now: u64 },

    /// The sequence for millisecond `timestamp` is exhausted and the clock
    /// did not advance past it in time.
    ///
    /// No ID is produced. The time source is frozen or far behind wall time.
    #[error("clock stuck at {timestamp} with its sequence exhausted")]
    ClockStalled { timestamp: u64 },

    /// Every leasing attempt failed (lock contention, exhausted pool, or store
    /// errors).
    #[error("failed to lease a worker ID after {attempts} attempts")]
    LeasingFailed { attempts: u32 },

    /// The coordination store reported a failure.
    #[error("coordination store error: {0}")]
    CoordinationStore(#[from] StoreError),

    /// The lease on `worker_id` could not be kept alive.
    #[error("lease on worker ID {worker_id} was lost")]
    LeaseLost { worker_id: u64 },

    /// The leasing configuration is unusable.
    #[error("invalid lease config: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Returns true for errors a caller can resolve by retrying later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ClockRegression { .. } | Self::ClockStalled { .. } | Self::CoordinationStore(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_regression_names_the_wait_target() {
        let err = Error::ClockRegression {
            last_timestamp: 100,
            now: 95,
        };
        assert!(err.to_string().contains("wait until 100"));
        assert!(err.is_retryable());
    }

    #[test]
    fn store_errors_convert() {
        let err: Error = StoreError::Unavailable {
            reason: "connection refused".into(),
        }
        .into();
        assert!(matches!(err, Error::CoordinationStore(_)));
        assert!(!Error::LeasingFailed { attempts: 3 }.is_retryable());
    }
}
