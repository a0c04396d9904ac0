use core::{fmt, hash::Hash};

/// A trait representing a layout-compatible Snowflake ID.
///
/// Implementors pack three fields into a single `u64`, from most to least
/// significant: the timestamp (milliseconds since the layout's epoch), the
/// leased worker ID, and the per-millisecond sequence. The top bit is always
/// reserved so every raw value fits in an `i64` without going negative.
///
/// # Example
///
/// ```
/// use snowlease::{SnowflakeId, SnowflakeLeaseId};
///
/// let id = SnowflakeLeaseId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.worker_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
pub trait SnowflakeId:
    Sized + Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Returns the timestamp portion of the ID.
    fn timestamp(&self) -> u64;

    /// Returns the maximum possible value for the timestamp field.
    fn max_timestamp() -> u64;

    /// Returns the worker ID portion of the ID.
    fn worker_id(&self) -> u64;

    /// Returns the maximum possible value for the worker ID field.
    fn max_worker_id() -> u64;

    /// Returns the sequence portion of the ID.
    fn sequence(&self) -> u64;

    /// Returns the maximum possible value for the sequence field.
    fn max_sequence() -> u64;

    /// Constructs a new ID from its components.
    ///
    /// Callers must keep each component within its field bounds. Out of range
    /// values are masked in release builds and trip a debug assertion
    /// otherwise.
    fn from_components(timestamp: u64, worker_id: u64, sequence: u64) -> Self;

    /// Converts this type into its raw integer representation.
    fn to_raw(&self) -> u64;

    /// Converts a raw integer into this type.
    fn from_raw(raw: u64) -> Self;

    /// Returns true if the current sequence value can be incremented.
    fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns the next sequence value.
    fn next_sequence(&self) -> u64 {
        self.sequence() + 1
    }

    /// Returns a new ID with the sequence incremented.
    fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.worker_id(), self.next_sequence())
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_components(ts, self.worker_id(), 0)
    }
}
