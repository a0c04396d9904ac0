use crate::id::SnowflakeId;

/// Represents the result of polling a generator for its next ID.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the current millisecond's sequence space is
///   spent and no ID can be produced until the clock advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus<ID: SnowflakeId> {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated Snowflake ID.
        id: ID,
    },
    /// The sequence is exhausted for the current tick.
    Pending {
        /// Milliseconds to wait before polling again.
        yield_for: u64,
    },
}
