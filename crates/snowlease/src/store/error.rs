/// A result type for coordination-store operations.
pub type StoreResult<T> = core::result::Result<T, StoreError>;

/// Failures reported by a [`CoordinationStore`] implementation.
///
/// [`CoordinationStore`]: crate::store::CoordinationStore
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store could not be reached (connection, timeout, shutdown).
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The store was reached but rejected or failed the operation on `key`.
    #[error("store operation on {key:?} failed: {reason}")]
    Operation { key: String, reason: String },
}
